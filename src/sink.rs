//! Presentation Sink: push-only event interface toward whatever renders a run.
//!
//! The orchestrator, pipeline and retry executor emit events fire-and-forget;
//! a sink never calls back into orchestration state.

use crate::error::FailureKind;
use crate::gateway::{GenerationRequest, ImagePayload};
use crate::orchestrator::Phase;
use crate::scene::SceneNumber;
use crate::story::{Character, SceneOutline};
use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PresentationEvent {
    ValidationError {
        message: String,
    },
    StoryReady {
        storyline: String,
        characters: Vec<Character>,
        scenes: Vec<SceneOutline>,
    },
    CoverReady {
        image: ImagePayload,
    },
    CoverFailed {
        message: String,
    },
    MusicReady {
        locator: String,
    },
    /// Music could not be generated; the viewer offers a manual play control
    MusicUnavailable {
        message: String,
    },
    SceneLoading {
        scene_number: SceneNumber,
    },
    SceneReady {
        scene_number: SceneNumber,
        image: ImagePayload,
    },
    SceneFailed {
        scene_number: SceneNumber,
        placeholder: ImagePayload,
        message: String,
    },
    Progress {
        phase: Phase,
        current: u32,
        total: u32,
    },
    /// About to issue attempt `attempt`; `remaining` attempts are left after it
    RequestAttempt {
        request: GenerationRequest,
        attempt: u32,
        remaining: u32,
    },
    RequestBackoff {
        request: GenerationRequest,
        attempt: u32,
        remaining: u32,
        wait_ms: u64,
        reason: FailureKind,
    },
    RunComplete {
        failed_count: usize,
    },
    RunFailed {
        message: String,
    },
}

impl PresentationEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            PresentationEvent::ValidationError { .. } => "validation_error",
            PresentationEvent::StoryReady { .. } => "story_ready",
            PresentationEvent::CoverReady { .. } => "cover_ready",
            PresentationEvent::CoverFailed { .. } => "cover_failed",
            PresentationEvent::MusicReady { .. } => "music_ready",
            PresentationEvent::MusicUnavailable { .. } => "music_unavailable",
            PresentationEvent::SceneLoading { .. } => "scene_loading",
            PresentationEvent::SceneReady { .. } => "scene_ready",
            PresentationEvent::SceneFailed { .. } => "scene_failed",
            PresentationEvent::Progress { .. } => "progress",
            PresentationEvent::RequestAttempt { .. } => "request_attempt",
            PresentationEvent::RequestBackoff { .. } => "request_backoff",
            PresentationEvent::RunComplete { .. } => "run_complete",
            PresentationEvent::RunFailed { .. } => "run_failed",
        }
    }
}

pub trait PresentationSink: Send + Sync {
    fn emit(&self, event: PresentationEvent);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn emit(&self, _event: PresentationEvent) {}
}

/// Sink that keeps every event in order; used by tests and summaries
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PresentationEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PresentationEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl PresentationSink for RecordingSink {
    fn emit(&self, event: PresentationEvent) {
        self.events.lock().push(event);
    }
}

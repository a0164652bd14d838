//! Generation Orchestrator
//!
//! Drives one run for a theme: story first, then cover and music together,
//! then every scene image through the [`ScenePipeline`]. Only a failed story
//! aborts the run; every other failure degrades to a per-unit result.
//!
//! At most one run is in flight per orchestrator. Starting another while the
//! phase is not terminal is rejected without touching any state.

use crate::error::StoryError;
use crate::gateway::{GenerationGateway, GenerationRequest, ImagePayload};
use crate::pacing::{PacingConfig, Sleeper};
use crate::pipeline::ScenePipeline;
use crate::retry::{RetryPolicy, RetryingExecutor};
use crate::scene::SceneBoard;
use crate::sink::{PresentationEvent, PresentationSink};
use crate::story::Story;
use futures::StreamExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const EMPTY_THEME_MESSAGE: &str = "Please enter a story theme.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    GeneratingStory,
    GeneratingCoverAndMusic,
    GeneratingScenes,
    Done,
    Failed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::GeneratingStory => "generating_story",
            Phase::GeneratingCoverAndMusic => "generating_cover_and_music",
            Phase::GeneratingScenes => "generating_scenes",
            Phase::Done => "done",
            Phase::Failed => "failed",
        }
    }

    /// True while a run owns the orchestrator
    pub fn is_in_flight(&self) -> bool {
        !matches!(self, Phase::Idle | Phase::Done | Phase::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationProgress {
    pub phase: Phase,
    /// Last scene number that resolved in the current run; 0 before the first
    pub current_scene_index: u32,
}

impl Default for OrchestrationProgress {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            current_scene_index: 0,
        }
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub theme: String,
    pub story: Story,
    pub scenes: SceneBoard,
    pub cover: Option<ImagePayload>,
    pub music: Option<String>,
    pub failed_scenes: usize,
    pub duration_ms: u64,
}

/// Marks the run Failed if it is dropped before reaching a terminal phase.
struct RunGuard<'a> {
    progress: &'a Mutex<OrchestrationProgress>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut progress = self.progress.lock();
        if progress.phase.is_in_flight() {
            warn!(
                phase = progress.phase.as_str(),
                "generation run abandoned before completion"
            );
            progress.phase = Phase::Failed;
        }
    }
}

pub struct GenerationOrchestrator {
    gateway: Arc<dyn GenerationGateway>,
    sink: Arc<dyn PresentationSink>,
    sleeper: Arc<dyn Sleeper>,
    pacing: PacingConfig,
    progress: Mutex<OrchestrationProgress>,
}

impl GenerationOrchestrator {
    pub fn new(
        gateway: Arc<dyn GenerationGateway>,
        sink: Arc<dyn PresentationSink>,
        sleeper: Arc<dyn Sleeper>,
        pacing: PacingConfig,
    ) -> Self {
        Self {
            gateway,
            sink,
            sleeper,
            pacing,
            progress: Mutex::new(OrchestrationProgress::default()),
        }
    }

    pub fn snapshot(&self) -> OrchestrationProgress {
        *self.progress.lock()
    }

    /// Run the whole workflow for `theme`.
    ///
    /// Returns `Validation` for an empty theme, `RunInProgress` when another
    /// run owns the orchestrator and `StoryFailed` when the story request
    /// fails. Cover, music and scene failures still produce a report.
    pub async fn start_run(&self, theme: &str) -> Result<RunReport, StoryError> {
        let theme = theme.trim();
        if theme.is_empty() {
            warn!("rejected generation run with empty theme");
            self.sink.emit(PresentationEvent::ValidationError {
                message: EMPTY_THEME_MESSAGE.to_string(),
            });
            return Err(StoryError::Validation(EMPTY_THEME_MESSAGE.to_string()));
        }

        let _guard = self.begin_run()?;
        let started = Instant::now();
        info!(theme, gateway = self.gateway.gateway_name(), "starting generation run");
        self.emit_progress(Phase::GeneratingStory, 0);

        // Step 1: story, a single attempt
        let mut story = match self.gateway.generate_story(theme).await {
            Ok(story) => story,
            Err(err) => {
                warn!(theme, failure = err.kind.as_str(), error = %err, "story generation failed");
                self.set_phase(Phase::Failed);
                self.sink.emit(PresentationEvent::RunFailed {
                    message: err.message.clone(),
                });
                return Err(StoryError::StoryFailed(err.message));
            }
        };
        story.normalize_scenes();
        let mut board = SceneBoard::from_story(&story)?;
        let total = board.len() as u32;
        self.sink.emit(PresentationEvent::StoryReady {
            storyline: story.storyline.clone(),
            characters: story.characters.clone(),
            scenes: story.scenes.clone(),
        });

        // Step 2: cover and music, joined on this task
        self.set_phase(Phase::GeneratingCoverAndMusic);
        self.emit_progress(Phase::GeneratingCoverAndMusic, 0);
        let (cover, music) = self.generate_cover_and_music(theme).await;

        // Step 3: scenes
        self.set_phase(Phase::GeneratingScenes);
        self.emit_progress(Phase::GeneratingScenes, 0);
        let pipeline = ScenePipeline::new(
            self.gateway.as_ref(),
            self.sink.as_ref(),
            self.sleeper.as_ref(),
            &self.pacing,
        );
        {
            let mut outcomes = pipeline.run(&mut board);
            while let Some((scene_number, outcome)) = outcomes.next().await {
                let current = scene_number.get();
                {
                    let mut progress = self.progress.lock();
                    progress.current_scene_index = progress.current_scene_index.max(current);
                }
                debug!(
                    scene_number = current,
                    success = outcome.is_success(),
                    "scene resolved"
                );
                self.emit_progress(Phase::GeneratingScenes, current);
            }
        }

        let failed_scenes = board.failed_count();
        self.set_phase(Phase::Done);
        self.sink.emit(PresentationEvent::RunComplete {
            failed_count: failed_scenes,
        });
        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            theme,
            scenes = total,
            failed_scenes,
            cover = cover.is_some(),
            music = music.is_some(),
            duration_ms,
            "generation run complete"
        );

        Ok(RunReport {
            theme: theme.to_string(),
            story,
            scenes: board,
            cover,
            music,
            failed_scenes,
            duration_ms,
        })
    }

    fn begin_run(&self) -> Result<RunGuard<'_>, StoryError> {
        let mut progress = self.progress.lock();
        if progress.phase.is_in_flight() {
            warn!(
                phase = progress.phase.as_str(),
                "rejected generation run while another is in flight"
            );
            return Err(StoryError::RunInProgress(progress.phase.as_str().to_string()));
        }
        *progress = OrchestrationProgress {
            phase: Phase::GeneratingStory,
            current_scene_index: 0,
        };
        Ok(RunGuard {
            progress: &self.progress,
        })
    }

    async fn generate_cover_and_music(&self, theme: &str) -> (Option<ImagePayload>, Option<String>) {
        let executor = RetryingExecutor::new(
            self.gateway.as_ref(),
            self.sink.as_ref(),
            self.sleeper.as_ref(),
            RetryPolicy::from_pacing(&self.pacing),
        );
        let cover_request = GenerationRequest::cover_image(theme);
        let music_request = GenerationRequest::music();

        let (cover_outcome, music_outcome) = futures::join!(
            executor.execute(&cover_request, self.pacing.cover_max_retries),
            executor.execute(&music_request, self.pacing.music_max_retries),
        );

        let cover = match cover_outcome.into_image() {
            Ok(image) => {
                self.sink.emit(PresentationEvent::CoverReady {
                    image: image.clone(),
                });
                Some(image)
            }
            Err((kind, message)) => {
                warn!(failure = kind.as_str(), error = %message, "cover image failed");
                self.sink.emit(PresentationEvent::CoverFailed { message });
                None
            }
        };

        let music = match music_outcome.into_music() {
            Ok(locator) => {
                self.sink.emit(PresentationEvent::MusicReady {
                    locator: locator.clone(),
                });
                Some(locator)
            }
            Err((kind, message)) => {
                warn!(failure = kind.as_str(), error = %message, "music unavailable");
                self.sink.emit(PresentationEvent::MusicUnavailable { message });
                None
            }
        };

        (cover, music)
    }

    fn set_phase(&self, phase: Phase) {
        let mut progress = self.progress.lock();
        debug!(from = progress.phase.as_str(), to = phase.as_str(), "phase transition");
        progress.phase = phase;
    }

    fn emit_progress(&self, phase: Phase, current: u32) {
        self.sink.emit(PresentationEvent::Progress {
            phase,
            current,
            total: crate::story::SCENE_COUNT,
        });
    }
}

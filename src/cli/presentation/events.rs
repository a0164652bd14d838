//! Terminal sink: renders presentation events as they arrive.
//!
//! Text mode prints one short, optionally colored line per event. JSON mode
//! prints one envelope per line: `{ts, run, seq, type, data}`.

use crate::error::StoryError;
use crate::sink::{PresentationEvent, PresentationSink};
use chrono::{SecondsFormat, Utc};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFormat {
    Text,
    Json,
}

impl EventFormat {
    pub fn parse(value: &str) -> Result<Self, StoryError> {
        match value {
            "text" => Ok(EventFormat::Text),
            "json" => Ok(EventFormat::Json),
            other => Err(StoryError::Validation(format!(
                "Invalid format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }
}

/// One JSON line in `--format json` output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEventRecord {
    pub ts: String,
    pub run: String,
    pub seq: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
}

impl RunEventRecord {
    pub fn from_event(run: &str, seq: u64, event: &PresentationEvent) -> Self {
        let data = serde_json::to_value(event)
            .ok()
            .and_then(|mut v| v.get_mut("data").map(Value::take))
            .unwrap_or(Value::Null);
        Self {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            run: run.to_string(),
            seq,
            event_type: event.event_type().to_string(),
            data,
        }
    }
}

pub struct TerminalSink {
    format: EventFormat,
    color: bool,
    run_id: String,
    seq: AtomicU64,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl TerminalSink {
    pub fn stdout(format: EventFormat, color: bool, run_id: impl Into<String>) -> Self {
        Self::with_writer(format, color, run_id, Box::new(std::io::stdout()))
    }

    pub fn with_writer(
        format: EventFormat,
        color: bool,
        run_id: impl Into<String>,
        writer: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            format,
            color,
            run_id: run_id.into(),
            seq: AtomicU64::new(0),
            writer: Mutex::new(writer),
        }
    }

    fn render(&self, event: &PresentationEvent) -> String {
        match self.format {
            EventFormat::Json => {
                let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
                let record = RunEventRecord::from_event(&self.run_id, seq, event);
                serde_json::to_string(&record).unwrap_or_default()
            }
            EventFormat::Text => format_event_text(event, self.color),
        }
    }
}

impl PresentationSink for TerminalSink {
    fn emit(&self, event: PresentationEvent) {
        let line = self.render(&event);
        let mut writer = self.writer.lock();
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            debug!(error = %e, "failed to write presentation event");
        }
    }
}

fn paint(text: String, color: bool, style: fn(&str) -> String) -> String {
    if color {
        style(&text)
    } else {
        text
    }
}

fn green(s: &str) -> String {
    s.green().to_string()
}

fn yellow(s: &str) -> String {
    s.yellow().to_string()
}

fn red(s: &str) -> String {
    s.red().to_string()
}

fn cyan(s: &str) -> String {
    s.cyan().to_string()
}

fn dim(s: &str) -> String {
    s.dimmed().to_string()
}

fn bold(s: &str) -> String {
    s.bold().to_string()
}

/// Human-readable line for one event
pub fn format_event_text(event: &PresentationEvent, color: bool) -> String {
    match event {
        PresentationEvent::ValidationError { message } => {
            paint(format!("error: {}", message), color, red)
        }
        PresentationEvent::StoryReady {
            storyline,
            characters,
            scenes,
        } => {
            let names: Vec<&str> = characters.iter().map(|c| c.name.as_str()).collect();
            format!(
                "{}\n  characters: {}\n  scenes: {}",
                paint(format!("story: {}", storyline), color, bold),
                if names.is_empty() {
                    "-".to_string()
                } else {
                    names.join(", ")
                },
                scenes.len()
            )
        }
        PresentationEvent::CoverReady { .. } => paint("cover ready".to_string(), color, green),
        PresentationEvent::CoverFailed { message } => {
            paint(format!("cover failed: {}", message), color, yellow)
        }
        PresentationEvent::MusicReady { locator } => {
            paint(format!("music ready: {}", locator), color, green)
        }
        PresentationEvent::MusicUnavailable { message } => paint(
            format!("music unavailable ({}); play it manually later", message),
            color,
            yellow,
        ),
        PresentationEvent::SceneLoading { scene_number } => {
            paint(format!("scene {}: generating", scene_number), color, dim)
        }
        PresentationEvent::SceneReady { scene_number, .. } => {
            paint(format!("scene {}: ready", scene_number), color, green)
        }
        PresentationEvent::SceneFailed {
            scene_number,
            message,
            ..
        } => paint(
            format!("scene {}: failed, showing placeholder ({})", scene_number, message),
            color,
            red,
        ),
        PresentationEvent::Progress {
            phase,
            current,
            total,
        } => paint(
            format!("[{}] {}/{}", phase.as_str(), current, total),
            color,
            cyan,
        ),
        PresentationEvent::RequestAttempt {
            request,
            attempt,
            remaining,
        } => paint(
            format!(
                "  {} attempt {} ({} left)",
                request.kind().as_str(),
                attempt,
                remaining
            ),
            color,
            dim,
        ),
        PresentationEvent::RequestBackoff {
            request,
            wait_ms,
            reason,
            ..
        } => paint(
            format!(
                "  {} {}, retrying in {:.1}s",
                request.kind().as_str(),
                reason.as_str(),
                *wait_ms as f64 / 1000.0
            ),
            color,
            yellow,
        ),
        PresentationEvent::RunComplete { failed_count } => {
            let line = format!("done: {} scene(s) failed", failed_count);
            if *failed_count == 0 {
                paint(line, color, green)
            } else {
                paint(line, color, yellow)
            }
        }
        PresentationEvent::RunFailed { message } => {
            paint(format!("run failed: {}", message), color, red)
        }
    }
}

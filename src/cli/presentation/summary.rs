//! End-of-command formatters: run summary table and configuration output.

use crate::config::{StoryloomConfig, ValidationError};
use crate::error::StoryError;
use crate::orchestrator::RunReport;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

const DESCRIPTION_WIDTH: usize = 60;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Scene table plus cover, music and timing lines
pub fn format_run_summary(report: &RunReport, color: bool) -> String {
    let mut out = String::new();
    let heading = format!("Story: {}", report.theme);
    if color {
        out.push_str(&format!("{}\n", heading.bold().underline()));
    } else {
        out.push_str(&format!("{}\n", heading));
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Scene", "Image", "Description"]);
    for slot in report.scenes.slots() {
        table.add_row(vec![
            slot.scene_number.to_string(),
            slot.image_state.as_str().to_string(),
            truncate(&slot.description, DESCRIPTION_WIDTH),
        ]);
    }
    out.push_str(&format!("{}\n", table));

    out.push_str(&format!(
        "  Cover: {}\n",
        if report.cover.is_some() { "ready" } else { "failed" }
    ));
    out.push_str(&format!(
        "  Music: {}\n",
        report.music.as_deref().unwrap_or("unavailable")
    ));
    out.push_str(&format!(
        "  Failed scenes: {}/{}\n",
        report.failed_scenes,
        report.scenes.len()
    ));
    out.push_str(&format!("  Duration: {:.1}s", report.duration_ms as f64 / 1000.0));
    out
}

pub fn format_config_output(config: &StoryloomConfig, format: &str) -> Result<String, StoryError> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(config)?),
        "toml" => toml::to_string_pretty(config)
            .map_err(|e| StoryError::ConfigError(format!("Failed to render config: {}", e))),
        other => Err(StoryError::Validation(format!(
            "Invalid format: {} (must be 'toml' or 'json')",
            other
        ))),
    }
}

pub fn format_validation_errors(errors: &[ValidationError]) -> String {
    let mut out = format!("Configuration has {} problem(s):", errors.len());
    for e in errors {
        out.push_str(&format!("\n  - {}", e));
    }
    out
}

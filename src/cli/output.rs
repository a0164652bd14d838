//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::StoryError;

/// Map domain errors to the line printed on stderr.
pub fn map_error(e: &StoryError) -> String {
    match e {
        StoryError::Validation(msg) => format!("error: {}", msg),
        StoryError::StoryFailed(msg) => format!("error: story generation failed: {}", msg),
        other => format!("error: {}", other),
    }
}

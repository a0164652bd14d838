//! Error types for the storyloom generation orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a gateway failure should be treated by the retry layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Gateway signaled 429; retried with exponential backoff
    RateLimited,
    /// Any other request failure that may succeed on retry
    Transient,
    /// Request rejected by the gateway; still retried within the budget
    Fatal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Transient => "transient",
            FailureKind::Fatal => "fatal",
        }
    }
}

/// Structured failure returned by a gateway operation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct GatewayError {
    pub kind: FailureKind,
    pub message: String,
    pub status: Option<u16>,
}

impl GatewayError {
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::RateLimited,
            message: message.into(),
            status: Some(429),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
            status: None,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Fatal,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Classify an HTTP status the way the generation service reports errors.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => Self::rate_limited(message),
            400..=499 => Self::fatal(message).with_status(status),
            _ => Self::transient(message).with_status(status),
        }
    }
}

/// Crate-level errors
#[derive(Debug, Error)]
pub enum StoryError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("A generation run is already in progress (phase: {0})")]
    RunInProgress(String),

    #[error("Story generation failed: {0}")]
    StoryFailed(String),

    #[error("Invalid scene number {0} (expected 1..={1})")]
    InvalidSceneNumber(u32, u32),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for StoryError {
    fn from(err: config::ConfigError) -> Self {
        StoryError::ConfigError(err.to_string())
    }
}

//! Configuration
//!
//! Layered settings for the gateway connection, request pacing and logging.
//! Sources, lowest precedence first: built-in defaults, the global user file,
//! workspace files, then `STORYLOOM__SECTION__KEY` environment variables.

use crate::gateway::GatewayConfig;
use crate::logging::LoggingConfig;
use crate::pacing::PacingConfig;
use serde::{Deserialize, Serialize};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryloomConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub pacing: PacingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Gateway(String),
    Pacing(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Gateway(msg) => write!(f, "Gateway: {}", msg),
            ValidationError::Pacing(msg) => write!(f, "Pacing: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl StoryloomConfig {
    /// Validate every section, collecting all problems
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.gateway.validate() {
            errors.push(ValidationError::Gateway(e));
        }
        if let Err(e) = self.pacing.validate() {
            errors.push(ValidationError::Pacing(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

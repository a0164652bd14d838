//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Only keys that other layers commonly override are seeded here; every other
/// field falls back to its serde default.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("gateway.base_url", "http://127.0.0.1:5000")?
        .set_default("pacing.scene_max_retries", 3i64)?
        .set_default("logging.output", "stderr")
}

//! Suspension seam for backoff waits and inter-scene spacing.
//!
//! Orchestration code never calls the timer directly; it asks a [`Sleeper`],
//! so tests can record waits without letting real time pass.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delays and retry budgets applied to gateway requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_scene_max_retries")]
    pub scene_max_retries: u32,

    /// Cover requests are not retried unless raised above 1
    #[serde(default = "default_single_attempt")]
    pub cover_max_retries: u32,

    #[serde(default = "default_single_attempt")]
    pub music_max_retries: u32,

    /// First rate-limit wait; doubles on each further rate-limited attempt
    #[serde(default = "default_rate_limit_base_ms")]
    pub rate_limit_base_ms: u64,

    #[serde(default = "default_error_retry_delay_ms")]
    pub error_retry_delay_ms: u64,

    /// Wait between finishing one scene image and requesting the next
    #[serde(default = "default_scene_spacing_ms")]
    pub scene_spacing_ms: u64,
}

fn default_scene_max_retries() -> u32 {
    3
}

fn default_single_attempt() -> u32 {
    1
}

fn default_rate_limit_base_ms() -> u64 {
    2000
}

fn default_error_retry_delay_ms() -> u64 {
    3000
}

fn default_scene_spacing_ms() -> u64 {
    8000
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            scene_max_retries: default_scene_max_retries(),
            cover_max_retries: default_single_attempt(),
            music_max_retries: default_single_attempt(),
            rate_limit_base_ms: default_rate_limit_base_ms(),
            error_retry_delay_ms: default_error_retry_delay_ms(),
            scene_spacing_ms: default_scene_spacing_ms(),
        }
    }
}

impl PacingConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("scene_max_retries", self.scene_max_retries),
            ("cover_max_retries", self.cover_max_retries),
            ("music_max_retries", self.music_max_retries),
        ] {
            if value == 0 {
                return Err(format!("{} must be at least 1", name));
            }
        }
        Ok(())
    }

    pub fn scene_spacing(&self) -> Duration {
        Duration::from_millis(self.scene_spacing_ms)
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records every requested wait and yields instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().clone()
    }

    pub fn waits_ms(&self) -> Vec<u64> {
        self.waits
            .lock()
            .iter()
            .map(|d| d.as_millis() as u64)
            .collect()
    }

    pub fn total(&self) -> Duration {
        self.waits.lock().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().push(duration);
        tokio::task::yield_now().await;
    }
}

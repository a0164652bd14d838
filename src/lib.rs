//! Storyloom: rate-limited orchestration of illustrated story generation
//!
//! A run turns a theme into a story, a cover image, background music and one
//! illustration per scene, all requested from a remote generation service
//! that may rate-limit or fail. Results are pushed to a presentation sink as
//! they arrive.

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod orchestrator;
pub mod pacing;
pub mod pipeline;
pub mod retry;
pub mod scene;
pub mod sink;
pub mod story;

pub use error::{FailureKind, GatewayError, StoryError};
pub use orchestrator::{GenerationOrchestrator, OrchestrationProgress, Phase, RunReport};

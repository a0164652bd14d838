//! Remote Generation Gateway
//!
//! Request/response contract for the four generation operations (story, music,
//! cover image, scene image). The gateway is opaque: implementations talk to
//! the generation service over HTTP ([`http::HttpGateway`]) or replay a script
//! ([`mock::ScriptedGateway`]). Every failure comes back as a [`GatewayError`]
//! whose kind tells the retry layer how to react.

use crate::error::{FailureKind, GatewayError};
use crate::scene::SceneNumber;
use crate::story::Story;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod http;
pub mod mock;

pub use http::HttpGateway;
pub use mock::{GatewayCall, ScriptedGateway};

/// Base64 of a 1x1 transparent PNG, shown in place of a scene image that never arrived
pub const PLACEHOLDER_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAAC0lEQVR42mNkAAIAAAoAAv/lxKUAAAAASUVORK5CYII=";

/// Gateway connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Root URL of the generation service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Image generation is slow; keep this generous
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<(), String> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err("Base URL cannot be empty".to_string());
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!(
                "Base URL must start with http:// or https://, got '{}'",
                url
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err("Request timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Encoded image bytes as delivered by the gateway (base64 PNG)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImagePayload(String);

impl ImagePayload {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn placeholder() -> Self {
        Self(PLACEHOLDER_PNG_BASE64.to_string())
    }

    pub fn is_placeholder(&self) -> bool {
        self.0 == PLACEHOLDER_PNG_BASE64
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.0)
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_placeholder() {
            write!(f, "ImagePayload(placeholder)")
        } else {
            write!(f, "ImagePayload({} chars)", self.0.len())
        }
    }
}

/// Operation kind of a [`GenerationRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    Story,
    Music,
    CoverImage,
    SceneImage,
}

impl GenerationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationKind::Story => "story",
            GenerationKind::Music => "music",
            GenerationKind::CoverImage => "cover_image",
            GenerationKind::SceneImage => "scene_image",
        }
    }
}

/// One logical gateway operation with its parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationRequest {
    Story { theme: String },
    Music,
    CoverImage { theme: String },
    SceneImage { scene_number: SceneNumber },
}

impl GenerationRequest {
    pub fn story(theme: impl Into<String>) -> Self {
        GenerationRequest::Story {
            theme: theme.into(),
        }
    }

    pub fn music() -> Self {
        GenerationRequest::Music
    }

    pub fn cover_image(theme: impl Into<String>) -> Self {
        GenerationRequest::CoverImage {
            theme: theme.into(),
        }
    }

    pub fn scene_image(scene_number: SceneNumber) -> Self {
        GenerationRequest::SceneImage { scene_number }
    }

    pub fn kind(&self) -> GenerationKind {
        match self {
            GenerationRequest::Story { .. } => GenerationKind::Story,
            GenerationRequest::Music => GenerationKind::Music,
            GenerationRequest::CoverImage { .. } => GenerationKind::CoverImage,
            GenerationRequest::SceneImage { .. } => GenerationKind::SceneImage,
        }
    }
}

/// Operation-specific success data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationPayload {
    Story(Story),
    /// Locator (URI) of the generated track
    Music(String),
    Image(ImagePayload),
}

/// Terminal result of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success(GenerationPayload),
    Failure { kind: FailureKind, message: String },
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success(_))
    }

    pub fn into_image(self) -> Result<ImagePayload, (FailureKind, String)> {
        match self {
            GenerationOutcome::Success(GenerationPayload::Image(image)) => Ok(image),
            GenerationOutcome::Success(other) => Err((
                FailureKind::Fatal,
                format!("Expected image payload, got {:?}", other),
            )),
            GenerationOutcome::Failure { kind, message } => Err((kind, message)),
        }
    }

    pub fn into_music(self) -> Result<String, (FailureKind, String)> {
        match self {
            GenerationOutcome::Success(GenerationPayload::Music(locator)) => Ok(locator),
            GenerationOutcome::Success(other) => Err((
                FailureKind::Fatal,
                format!("Expected music payload, got {:?}", other),
            )),
            GenerationOutcome::Failure { kind, message } => Err((kind, message)),
        }
    }
}

impl From<GatewayError> for GenerationOutcome {
    fn from(err: GatewayError) -> Self {
        GenerationOutcome::Failure {
            kind: err.kind,
            message: err.message,
        }
    }
}

/// Generation service client trait
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Generate storyline, characters and scene outlines for a theme
    async fn generate_story(&self, theme: &str) -> Result<Story, GatewayError>;

    /// Generate background music, returning its locator
    async fn generate_music(&self) -> Result<String, GatewayError>;

    async fn generate_cover_image(&self, theme: &str) -> Result<ImagePayload, GatewayError>;

    /// Generate the illustration for one scene of the current story
    async fn generate_scene_image(&self, scene: SceneNumber)
        -> Result<ImagePayload, GatewayError>;

    /// Gateway name used in logs
    fn gateway_name(&self) -> &str;
}

/// Issue a request against the matching gateway operation.
pub async fn dispatch<G>(gateway: &G, request: &GenerationRequest) -> GenerationOutcome
where
    G: GenerationGateway + ?Sized,
{
    let result = match request {
        GenerationRequest::Story { theme } => gateway
            .generate_story(theme)
            .await
            .map(GenerationPayload::Story),
        GenerationRequest::Music => gateway.generate_music().await.map(GenerationPayload::Music),
        GenerationRequest::CoverImage { theme } => gateway
            .generate_cover_image(theme)
            .await
            .map(GenerationPayload::Image),
        GenerationRequest::SceneImage { scene_number } => gateway
            .generate_scene_image(*scene_number)
            .await
            .map(GenerationPayload::Image),
    };
    match result {
        Ok(payload) => GenerationOutcome::Success(payload),
        Err(err) => err.into(),
    }
}

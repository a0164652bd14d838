//! HTTP gateway for the story generation service.
//!
//! The service keeps the generated story in a server-side session, so the client
//! keeps a cookie store: scene image requests only carry a scene number.

use super::{GatewayConfig, GenerationGateway, ImagePayload};
use crate::error::{GatewayError, StoryError};
use crate::scene::SceneNumber;
use crate::story::Story;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Deserialize)]
struct MusicResponse {
    music_url: Option<String>,
}

#[derive(Deserialize)]
struct ImageResponse {
    image_b64: Option<String>,
}

// Map transport-level failures; status errors are handled from the response.
fn map_http_error(error: reqwest::Error) -> GatewayError {
    if let Some(status) = error.status() {
        GatewayError::from_status(status.as_u16(), format!("HTTP error: {}", error))
    } else if error.is_timeout() {
        GatewayError::transient(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        GatewayError::transient(format!("Connection error: {}", error))
    } else {
        GatewayError::transient(format!("HTTP error: {}", error))
    }
}

fn build_gateway_http_client(config: &GatewayConfig) -> Result<Client, StoryError> {
    Client::builder()
        .cookie_store(true)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| StoryError::Gateway(format!("Failed to create HTTP client: {}", e)))
}

/// Gateway backed by the generation service's JSON endpoints
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, StoryError> {
        config.validate().map_err(StoryError::ConfigError)?;
        let client = build_gateway_http_client(config)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<T, GatewayError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "gateway request");
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorBody>(&error_text)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or(error_text);
            warn!(url = %url, status = status.as_u16(), error = %message, "gateway request failed");
            return Err(GatewayError::from_status(status.as_u16(), message));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::transient(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl GenerationGateway for HttpGateway {
    async fn generate_story(&self, theme: &str) -> Result<Story, GatewayError> {
        let value: Value = self
            .post_json("generate_story", json!({ "theme": theme }))
            .await?;
        if value.get("storyline").and_then(Value::as_str).is_none() {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            return Err(GatewayError::transient(message));
        }
        serde_json::from_value(value)
            .map_err(|e| GatewayError::transient(format!("Failed to parse story: {}", e)))
    }

    async fn generate_music(&self) -> Result<String, GatewayError> {
        let response: MusicResponse = self.post_json("generate_music", json!({})).await?;
        response
            .music_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| GatewayError::transient("No music URL in response"))
    }

    async fn generate_cover_image(&self, theme: &str) -> Result<ImagePayload, GatewayError> {
        let response: ImageResponse = self
            .post_json("generate_cover_image", json!({ "theme": theme }))
            .await?;
        image_from_response(response)
    }

    async fn generate_scene_image(
        &self,
        scene: SceneNumber,
    ) -> Result<ImagePayload, GatewayError> {
        let response: ImageResponse = self
            .post_json(
                "generate_scene_image",
                json!({ "scene_number": scene.get() }),
            )
            .await?;
        image_from_response(response)
    }

    fn gateway_name(&self) -> &str {
        "http"
    }
}

fn image_from_response(response: ImageResponse) -> Result<ImagePayload, GatewayError> {
    response
        .image_b64
        .filter(|b64| !b64.is_empty())
        .map(ImagePayload::new)
        .ok_or_else(|| GatewayError::transient("Base64 image data not found in response"))
}

//! Together AI image generation client.

use crate::http::{api_key_from_env, parse_json, transport_error};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use derive_builder::Builder;
use derive_getters::Getters;
use flipbook_error::{UpstreamError, UpstreamErrorKind};
use flipbook_interface::ImageRenderer;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Environment variable holding the Together API key.
pub const TOGETHER_API_KEY_ENV: &str = "TOGETHER_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.together.xyz/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Rendering parameters sent with every prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Image model identifier
    pub model: String,
    /// Diffusion steps (FLUX schnell models accept at most 4)
    pub steps: u32,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            model: "black-forest-labs/FLUX.1-schnell-Free".to_string(),
            steps: 4,
            width: 1024,
            height: 1024,
        }
    }
}

/// Request body for `POST /images/generations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder, Getters)]
#[builder(setter(into))]
pub struct TogetherImageRequest {
    /// Image model identifier
    model: String,
    /// Text prompt
    prompt: String,
    /// Diffusion steps
    steps: u32,
    /// Number of images
    #[builder(default = "1")]
    n: u32,
    /// Output width in pixels
    width: u32,
    /// Output height in pixels
    height: u32,
    /// Always `b64_json`
    #[builder(default = "\"b64_json\".to_string()")]
    response_format: String,
    /// Always `png`
    #[builder(default = "\"png\".to_string()")]
    output_format: String,
}

impl TogetherImageRequest {
    /// Creates a new builder for `TogetherImageRequest`.
    pub fn builder() -> TogetherImageRequestBuilder {
        TogetherImageRequestBuilder::default()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    b64_json: Option<String>,
}

/// Response body of `POST /images/generations`.
#[derive(Debug, Clone, Deserialize)]
pub struct TogetherImageResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

impl TogetherImageResponse {
    /// Decode the first image.
    ///
    /// # Errors
    ///
    /// `InvalidResponse` when no image is present or its base64 is malformed.
    pub fn into_bytes(self) -> Result<Vec<u8>, UpstreamError> {
        let encoded = self
            .data
            .into_iter()
            .find_map(|d| d.b64_json)
            .ok_or_else(|| {
                UpstreamError::new(UpstreamErrorKind::InvalidResponse(
                    "response contains no b64_json image".to_string(),
                ))
            })?;
        STANDARD.decode(encoded.trim()).map_err(|e| {
            UpstreamError::new(UpstreamErrorKind::InvalidResponse(format!(
                "invalid base64 image: {}",
                e
            )))
        })
    }
}

/// Together AI images client.
#[derive(Debug, Clone)]
pub struct TogetherImageClient {
    client: Client,
    api_key: String,
    base_url: String,
    settings: ImageSettings,
}

impl TogetherImageClient {
    /// Client reading the key from `TOGETHER_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns `MissingApiKey` if the variable is unset or blank.
    #[instrument(skip_all)]
    pub fn new(settings: ImageSettings) -> Result<Self, UpstreamError> {
        let api_key = api_key_from_env(TOGETHER_API_KEY_ENV)?;
        Self::with_api_key(api_key, settings)
    }

    /// Client with an explicit API key.
    pub fn with_api_key(
        api_key: impl Into<String>,
        settings: ImageSettings,
    ) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport_error)?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            settings,
        })
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The rendering parameters.
    pub fn settings(&self) -> &ImageSettings {
        &self.settings
    }

    /// Request body for `prompt`.
    pub fn request_for(&self, prompt: &str) -> TogetherImageRequest {
        TogetherImageRequest {
            model: self.settings.model.clone(),
            prompt: prompt.to_string(),
            steps: self.settings.steps,
            n: 1,
            width: self.settings.width,
            height: self.settings.height,
            response_format: "b64_json".to_string(),
            output_format: "png".to_string(),
        }
    }
}

#[async_trait]
impl ImageRenderer for TogetherImageClient {
    #[instrument(skip(self, prompt), fields(model = %self.settings.model, steps = self.settings.steps))]
    async fn render(&self, prompt: &str) -> Result<Vec<u8>, UpstreamError> {
        let url = format!("{}/images/generations", self.base_url.trim_end_matches('/'));
        debug!(url = %url, "Sending Together image request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_for(prompt))
            .send()
            .await
            .map_err(transport_error)?;

        let body: TogetherImageResponse = parse_json(response).await?;
        let bytes = body.into_bytes()?;
        debug!(bytes = bytes.len(), "Received image");
        Ok(bytes)
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let client = TogetherImageClient::with_api_key("k", ImageSettings::default()).unwrap();
        let json = serde_json::to_value(client.request_for("a lighthouse")).unwrap();
        assert_eq!(json["model"], "black-forest-labs/FLUX.1-schnell-Free");
        assert_eq!(json["prompt"], "a lighthouse");
        assert_eq!(json["steps"], 4);
        assert_eq!(json["n"], 1);
        assert_eq!(json["response_format"], "b64_json");
        assert_eq!(json["output_format"], "png");
    }

    #[test]
    fn test_builder_defaults() {
        let request = TogetherImageRequest::builder()
            .model("m")
            .prompt("p")
            .steps(2u32)
            .width(512u32)
            .height(256u32)
            .build()
            .unwrap();
        assert_eq!(*request.n(), 1);
        assert_eq!(request.response_format(), "b64_json");
        assert_eq!(request.output_format(), "png");
    }

    #[test]
    fn test_decodes_first_image() {
        let encoded = STANDARD.encode([0x89, b'P', b'N', b'G']);
        let body = format!(r#"{{"data": [{{"b64_json": "{}"}}]}}"#, encoded);
        let response: TogetherImageResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(response.into_bytes().unwrap(), vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_missing_image_is_invalid_response() {
        let response: TogetherImageResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();
        let err = response.into_bytes().unwrap_err();
        assert!(matches!(err.kind, UpstreamErrorKind::InvalidResponse(_)));
    }

    #[test]
    fn test_bad_base64_is_invalid_response() {
        let response: TogetherImageResponse =
            serde_json::from_str(r#"{"data": [{"b64_json": "%%%"}]}"#).unwrap();
        assert!(response.into_bytes().is_err());
    }
}

//! Gemini `generateContent` client.

use crate::http::{api_key_from_env, parse_json, transport_error};
use async_trait::async_trait;
use derive_builder::Builder;
use derive_getters::Getters;
use flipbook_error::{UpstreamError, UpstreamErrorKind};
use flipbook_interface::PromptGenerator;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Environment variable holding the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// A text part of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeminiPart {
    /// Text content
    #[serde(default)]
    pub text: String,
}

/// One message in a `generateContent` exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeminiContent {
    /// "user" or "model"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Message parts
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

impl GeminiContent {
    /// A single-part user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![GeminiPart { text: text.into() }],
        }
    }
}

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder, Getters)]
#[builder(setter(into))]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// Conversation contents
    contents: Vec<GeminiContent>,
    /// Optional system instruction
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
}

impl GeminiRequest {
    /// Creates a new builder for `GeminiRequest`.
    pub fn builder() -> GeminiRequestBuilder {
        GeminiRequestBuilder::default()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Response body of `generateContent`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate.
    ///
    /// # Errors
    ///
    /// A blocked prompt is `Rejected`; a reply without text is
    /// `InvalidResponse`.
    pub fn into_text(self) -> Result<String, UpstreamError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(UpstreamError::new(UpstreamErrorKind::Rejected(format!(
                "prompt blocked: {}",
                reason
            ))));
        }
        let candidate = self.candidates.into_iter().next().ok_or_else(|| {
            UpstreamError::new(UpstreamErrorKind::InvalidResponse(
                "response has no candidates".to_string(),
            ))
        })?;
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(UpstreamError::new(UpstreamErrorKind::InvalidResponse(
                format!(
                    "candidate has no text (finish reason: {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ),
            )));
        }
        Ok(text)
    }
}

/// Gemini REST client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Client for `model`, reading the key from `GEMINI_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns `MissingApiKey` if the variable is unset or blank.
    #[instrument(skip_all)]
    pub fn new(model: impl Into<String>) -> Result<Self, UpstreamError> {
        let api_key = api_key_from_env(GEMINI_API_KEY_ENV)?;
        Self::with_api_key(api_key, model)
    }

    /// Client with an explicit API key.
    pub fn with_api_key(
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport_error)?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        })
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Full endpoint URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl PromptGenerator for GeminiClient {
    #[instrument(skip(self, instruction), fields(model = %self.model, chars = instruction.len()))]
    async fn generate(&self, instruction: &str) -> Result<String, UpstreamError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent::user(instruction)],
            system_instruction: None,
        };

        let url = self.endpoint();
        debug!(url = %url, "Sending Gemini request");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let body: GeminiResponse = parse_json(response).await?;
        body.into_text()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_camel_case() {
        let request = GeminiRequest::builder()
            .contents(vec![GeminiContent::user("draw a cat")])
            .system_instruction(Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: "be brief".into(),
                }],
            }))
            .build()
            .unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "draw a cat");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be brief");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "A misty "}, {"text": "forest"}]},
                "finishReason": "STOP"
            }]
        }"#;
        let response: GeminiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.into_text().unwrap(), "A misty forest");
    }

    #[test]
    fn test_blocked_prompt_is_permanent() {
        let body = r#"{"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}"#;
        let response: GeminiResponse = serde_json::from_str(body).unwrap();
        let err = response.into_text().unwrap_err();
        assert!(matches!(err.kind, UpstreamErrorKind::Rejected(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_missing_text_is_invalid_response() {
        let body = r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#;
        let response: GeminiResponse = serde_json::from_str(body).unwrap();
        let err = response.into_text().unwrap_err();
        assert!(matches!(err.kind, UpstreamErrorKind::InvalidResponse(_)));
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::with_api_key("k", "gemini-1.5-pro")
            .unwrap()
            .with_base_url("http://localhost:9/v1beta/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }
}

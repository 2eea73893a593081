//! Response classification shared by the HTTP clients.

use flipbook_error::{UpstreamError, UpstreamErrorKind};
use reqwest::Response;
use serde::de::DeserializeOwned;

/// Map a transport-level failure.
///
/// Timeouts, connection and body-transfer problems are network errors
/// (transient); anything else means the request itself was unusable.
pub(crate) fn transport_error(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        UpstreamError::new(UpstreamErrorKind::Network(err.to_string()))
    } else if err.is_decode() {
        UpstreamError::new(UpstreamErrorKind::InvalidResponse(err.to_string()))
    } else {
        UpstreamError::new(UpstreamErrorKind::Rejected(err.to_string()))
    }
}

/// Turn a non-success status into an [`UpstreamError`], or parse the body.
pub(crate) async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, UpstreamError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UpstreamError::from_status(status.as_u16(), body));
    }
    let body = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&body).map_err(|e| {
        UpstreamError::new(UpstreamErrorKind::InvalidResponse(format!(
            "failed to parse response: {}",
            e
        )))
    })
}

/// Read a required API key from the environment.
pub(crate) fn api_key_from_env(var: &str) -> Result<String, UpstreamError> {
    std::env::var(var)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| UpstreamError::new(UpstreamErrorKind::MissingApiKey(var.to_string())))
}

//! Remote model clients for the Flipbook pipeline.
//!
//! - [`GeminiClient`] implements [`PromptGenerator`](flipbook_interface::PromptGenerator)
//!   over the Gemini `generateContent` REST endpoint.
//! - [`TogetherImageClient`] implements [`ImageRenderer`](flipbook_interface::ImageRenderer)
//!   over the Together AI images endpoint.
//!
//! Both classify failures into transient and permanent
//! [`UpstreamError`](flipbook_error::UpstreamError)s so the retry policy can
//! decide what to repeat.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod gemini;
mod http;
mod together;

pub use gemini::{
    GEMINI_API_KEY_ENV, GeminiClient, GeminiContent, GeminiPart, GeminiRequest,
    GeminiRequestBuilder, GeminiResponse,
};
pub use together::{
    ImageSettings, TOGETHER_API_KEY_ENV, TogetherImageClient, TogetherImageRequest,
    TogetherImageRequestBuilder, TogetherImageResponse,
};

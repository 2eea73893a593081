//! Trait definitions for the collaborators the Flipbook pipeline talks to.
//!
//! Each remote or external dependency sits behind one narrow trait so the
//! pipeline, renderer loop and assembler can be driven by test doubles.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use flipbook_core::EncodeRequest;
use flipbook_error::{AssemblyError, UpstreamError};
use std::sync::Arc;

/// A text model that turns an instruction into a single prompt.
#[async_trait]
pub trait PromptGenerator: Send + Sync {
    /// Send one instruction and return the model's reply text.
    async fn generate(&self, instruction: &str) -> Result<String, UpstreamError>;

    /// Model identifier (e.g., "gemini-1.5-pro").
    fn model_name(&self) -> &str;
}

/// A text-to-image service.
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    /// Render one prompt and return the encoded image bytes.
    async fn render(&self, prompt: &str) -> Result<Vec<u8>, UpstreamError>;

    /// Model identifier (e.g., "black-forest-labs/FLUX.1-schnell-Free").
    fn model_name(&self) -> &str;
}

/// Writes an ordered frame list into a video file.
#[async_trait]
pub trait VideoEncoder: Send + Sync {
    /// Encode the request's frames to its output path.
    async fn encode(&self, request: &EncodeRequest) -> Result<(), AssemblyError>;
}

#[async_trait]
impl<T: PromptGenerator + ?Sized> PromptGenerator for Arc<T> {
    async fn generate(&self, instruction: &str) -> Result<String, UpstreamError> {
        (**self).generate(instruction).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

#[async_trait]
impl<T: ImageRenderer + ?Sized> ImageRenderer for Arc<T> {
    async fn render(&self, prompt: &str) -> Result<Vec<u8>, UpstreamError> {
        (**self).render(prompt).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

#[async_trait]
impl<T: VideoEncoder + ?Sized> VideoEncoder for Arc<T> {
    async fn encode(&self, request: &EncodeRequest) -> Result<(), AssemblyError> {
        (**self).encode(request).await
    }
}

//! Sequential prompt generation.
//!
//! [`SequentialPromptPipeline`] asks a [`PromptGenerator`](flipbook_interface::PromptGenerator)
//! for N frame descriptions, each one derived from the previously accepted
//! description. Failures never escape: the pipeline always hands back a
//! [`GenerationRun`](flipbook_core::GenerationRun) holding whatever prefix was
//! produced, with a diagnostic when it stopped short.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod pipeline;
pub mod prompts;

pub use pipeline::{PipelineConfig, SequentialPromptPipeline, StateObserver};

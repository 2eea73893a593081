//! Flipbook - Scene-to-Video Generation
//!
//! Flipbook turns a one-line scene description into a short animation. A text
//! model writes one image prompt per frame, each derived from the previous
//! one; an image model renders every prompt; the frames are ordered and
//! encoded into an H.264 video.
//!
//! # Features
//!
//! - **Sequential Prompts**: Frame *i* is only ever derived from frame *i-1*'s accepted text
//! - **Retry with Backoff**: Transient upstream failures are retried with jittered exponential backoff
//! - **Partial Results**: A run that fails mid-sequence keeps and archives its prefix
//! - **Prompt Archive**: Timestamped JSON records, queryable for the latest run
//! - **Natural Ordering**: `frame_2` sorts before `frame_10`
//! - **Video Assembly**: Size reconciliation, slowdown and ffmpeg encoding
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use flipbook::{FlipbookConfig, GenerationOrchestrator};
//! use std::num::NonZeroUsize;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FlipbookConfig::load()?;
//!     let orchestrator = GenerationOrchestrator::from_config(&config)?;
//!
//!     let report = orchestrator
//!         .generate("a paper boat drifting down a rainy gutter", NonZeroUsize::new(8).unwrap())
//!         .await?;
//!     println!("Video: {}", report.video().output_path().display());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Flipbook is organized as a workspace with focused crates:
//!
//! - `flipbook_error` - Error types
//! - `flipbook_core` - Core data types (GenerationRun, FrameFile, VideoSpec, etc.)
//! - `flipbook_interface` - PromptGenerator, ImageRenderer and VideoEncoder traits
//! - `flipbook_retry` - Retry policy with exponential backoff
//! - `flipbook_pipeline` - Sequential prompt pipeline
//! - `flipbook_storage` - Prompt archive
//! - `flipbook_video` - Frame catalog, video assembler, ffmpeg encoder
//! - `flipbook_models` - Gemini and Together AI clients
//!
//! This crate (`flipbook`) adds configuration and the orchestrator, and
//! re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod orchestrator;
mod render;

pub use config::{
    ArchiveConfig, ConfigOverrides, ENV_PREFIX, FlipbookConfig, FramesConfig, ModelsConfig,
    VideoConfig, resolve_size,
};
pub use orchestrator::{GenerationOrchestrator, GenerationReport, Stage, archive_prompts};
pub use render::{FrameRenderer, frame_file_name, record_frames_dir};

// Re-export error types
pub use flipbook_error::{
    AssemblyError, AssemblyErrorKind, CatalogError, CatalogErrorKind, ConfigError, FlipbookError,
    FlipbookErrorKind, FlipbookResult, OrchestrationError, OrchestrationErrorKind, RetryError,
    RetryErrorKind, RetryableError, StorageError, StorageErrorKind, UpstreamError,
    UpstreamErrorKind,
};

// Re-export core types
pub use flipbook_core::{
    AssembledVideo, DEFAULT_FPS, Dimensions, EncodeRequest, FrameFile, FramePrompt, GenerationRun,
    KeySegment, PipelineState, RunStatus, SequenceKey, VideoSpec,
};

// Re-export collaborator traits
pub use flipbook_interface::{ImageRenderer, PromptGenerator, VideoEncoder};

// Re-export stages
pub use flipbook_pipeline::{PipelineConfig, SequentialPromptPipeline, StateObserver};
pub use flipbook_retry::{RetryAttempt, RetryConfig, RetryObserver, RetryPolicy};
pub use flipbook_storage::{ARCHIVE_PREFIX, ArchiveRecord, PromptArchive};
pub use flipbook_video::{
    ConsistencyReport, DEFAULT_FRAME_PATTERN, DEFAULT_OUTPUT_NAME, FfmpegConfig, FfmpegEncoder,
    FrameCatalog, FramePattern, VideoAssembler,
};

// Re-export model clients
pub use flipbook_models::{
    GEMINI_API_KEY_ENV, GeminiClient, ImageSettings, TOGETHER_API_KEY_ENV, TogetherImageClient,
};

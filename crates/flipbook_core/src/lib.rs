//! Core data types for the Flipbook pipeline.
//!
//! This crate provides the data model shared by every stage: generation runs
//! and their prompts, discovered frame files with their natural ordering key,
//! and the playback parameters and result of video assembly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod frame;
mod run;
mod sequence;
mod video;

pub use frame::{Dimensions, FrameFile};
pub use run::{FramePrompt, GenerationRun, PipelineState, RunStatus};
pub use sequence::{KeySegment, SequenceKey};
pub use video::{AssembledVideo, DEFAULT_FPS, EncodeRequest, VideoSpec};

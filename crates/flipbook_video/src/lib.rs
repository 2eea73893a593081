//! Frame discovery and video assembly.
//!
//! - [`FrameCatalog`] finds frame images in a directory, orders them
//!   naturally (`frame_2` before `frame_10`) and checks that they share one size.
//! - [`VideoAssembler`] validates playback parameters, settles the output
//!   size and hands the ordered frames to a [`VideoEncoder`](flipbook_interface::VideoEncoder).
//! - [`FfmpegEncoder`] is the production encoder: H.264 in MP4, no audio.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assembler;
mod catalog;
mod ffmpeg;
mod pattern;

pub use assembler::{DEFAULT_OUTPUT_NAME, VideoAssembler};
pub use catalog::{ConsistencyReport, FrameCatalog};
pub use ffmpeg::{FfmpegConfig, FfmpegEncoder};
pub use pattern::{DEFAULT_FRAME_PATTERN, FramePattern};

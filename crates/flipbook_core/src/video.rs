//! Video assembly parameters and results.

use crate::{Dimensions, FrameFile};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::PathBuf;

/// Frames per second used when none is given.
pub const DEFAULT_FPS: u32 = 24;

/// Requested playback parameters.
///
/// `width` and `height` are given together or not at all; the assembler
/// rejects a lone one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct VideoSpec {
    /// Nominal frames per second
    fps: u32,
    /// Divides `fps`; each frame is shown `slowdown` times longer
    slowdown: u32,
    /// Target width in pixels
    width: Option<u32>,
    /// Target height in pixels
    height: Option<u32>,
}

impl Default for VideoSpec {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            slowdown: 1,
            width: None,
            height: None,
        }
    }
}

impl VideoSpec {
    /// Playback at `fps` with no slowdown or resize.
    pub fn new(fps: u32) -> Self {
        Self {
            fps,
            ..Self::default()
        }
    }

    /// Set the slowdown factor.
    pub fn with_slowdown(mut self, slowdown: u32) -> Self {
        self.slowdown = slowdown;
        self
    }

    /// Set the output size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set width and height independently; validation happens at assembly.
    pub fn with_optional_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Explicit target size, if both halves are set.
    pub fn target_size(&self) -> Option<Dimensions> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(Dimensions::new(w, h)),
            _ => None,
        }
    }

    /// `fps / slowdown`, or `None` if either is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use flipbook_core::VideoSpec;
    ///
    /// assert_eq!(VideoSpec::new(24).with_slowdown(2).effective_fps(), Some(12.0));
    /// assert_eq!(VideoSpec::new(24).with_slowdown(0).effective_fps(), None);
    /// ```
    pub fn effective_fps(&self) -> Option<f64> {
        let fps = NonZeroU32::new(self.fps)?;
        let slowdown = NonZeroU32::new(self.slowdown)?;
        Some(f64::from(fps.get()) / f64::from(slowdown.get()))
    }
}

/// Everything an encoder needs to write one video.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct EncodeRequest {
    /// Frames in playback order
    frames: Vec<FrameFile>,
    /// Playback rate after slowdown
    effective_fps: f64,
    /// Output size if frames must be scaled
    resize: Option<Dimensions>,
    /// Destination file
    output_path: PathBuf,
}

impl EncodeRequest {
    /// Build a request.
    pub fn new(
        frames: Vec<FrameFile>,
        effective_fps: f64,
        resize: Option<Dimensions>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            frames,
            effective_fps,
            resize,
            output_path: output_path.into(),
        }
    }

    /// How long each frame stays on screen.
    pub fn frame_duration_secs(&self) -> f64 {
        1.0 / self.effective_fps
    }
}

/// A finished video file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct AssembledVideo {
    /// Where the file was written
    output_path: PathBuf,
    /// Number of frames encoded
    frame_count: usize,
    /// Playback rate after slowdown
    effective_fps: f64,
    /// `frame_count / effective_fps`
    duration_secs: f64,
    /// Size of the encoded frames
    dimensions: Option<Dimensions>,
}

impl AssembledVideo {
    /// Record a finished encode.
    pub fn new(
        output_path: impl Into<PathBuf>,
        frame_count: usize,
        effective_fps: f64,
        dimensions: Option<Dimensions>,
    ) -> Self {
        Self {
            output_path: output_path.into(),
            frame_count,
            effective_fps,
            duration_secs: frame_count as f64 / effective_fps,
            dimensions,
        }
    }
}

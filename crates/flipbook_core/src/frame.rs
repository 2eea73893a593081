//! Image frames on disk.

use crate::SequenceKey;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Pixel dimensions of an image.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("{}x{}", width, height)]
pub struct Dimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Dimensions {
    /// Construct from width and height.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// An image file that belongs to an animation sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct FrameFile {
    /// Location on disk
    path: PathBuf,
    /// Natural ordering key of the file name
    sequence_key: SequenceKey,
    /// Pixel size read from the image header
    dimensions: Dimensions,
}

impl FrameFile {
    /// Pair a path with its measured dimensions, keyed by its file name.
    pub fn new(path: impl Into<PathBuf>, dimensions: Dimensions) -> Self {
        let path = path.into();
        let sequence_key = path
            .file_name()
            .map(|n| SequenceKey::new(&n.to_string_lossy()))
            .unwrap_or_else(|| SequenceKey::new(""));
        Self {
            path,
            sequence_key,
            dimensions,
        }
    }

    /// File name component, lossily decoded.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Borrow the path.
    pub fn as_path(&self) -> &Path {
        &self.path
    }
}

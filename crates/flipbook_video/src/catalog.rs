//! Frame discovery and geometric consistency.

use crate::FramePattern;
use derive_getters::Getters;
use flipbook_core::{Dimensions, FrameFile, SequenceKey};
use flipbook_error::{CatalogError, CatalogErrorKind, FlipbookResult};
use image::ImageReader;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Result of comparing every frame against the first one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ConsistencyReport {
    /// True when every frame matches the first frame's size
    consistent: bool,
    /// Size of the first frame, used as the fallback resize target
    reference: Dimensions,
    /// First frame whose size differs, if any
    divergent: Option<PathBuf>,
}

/// Discovers frame images and imposes a total order on them.
///
/// Source frames are only read, never modified.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCatalog;

impl FrameCatalog {
    /// Create a catalog.
    pub fn new() -> Self {
        Self
    }

    /// List files in `directory` matching `pattern`, in natural order.
    ///
    /// Names are ordered by [`SequenceKey`], ties broken by the raw name, so
    /// repeated calls on an unchanged directory return the same sequence.
    /// Image headers are read on the blocking pool and decoded by content,
    /// so a frame's extension need not match its encoding.
    ///
    /// # Errors
    ///
    /// `DirectoryNotFound` and `NoFramesFound` are decided from the directory
    /// listing alone, before any image is opened. A frame whose header cannot
    /// be read yields `ImageRead`.
    #[instrument(skip_all, fields(directory = %directory.display(), pattern = %pattern))]
    pub async fn discover(
        &self,
        directory: &Path,
        pattern: &FramePattern,
    ) -> FlipbookResult<Vec<FrameFile>> {
        let is_dir = tokio::fs::metadata(directory)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(CatalogError::new(CatalogErrorKind::DirectoryNotFound(
                directory.display().to_string(),
            ))
            .into());
        }

        let read_failed = |e: std::io::Error| {
            CatalogError::new(CatalogErrorKind::DirectoryRead(format!(
                "{}: {}",
                directory.display(),
                e
            )))
        };

        let mut entries = tokio::fs::read_dir(directory).await.map_err(read_failed)?;
        let mut matches = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_failed)? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !pattern.matches(&name) {
                continue;
            }
            let path = entry.path();
            if tokio::fs::metadata(&path).await.map_err(read_failed)?.is_file() {
                matches.push((name, path));
            }
        }

        if matches.is_empty() {
            return Err(CatalogError::new(CatalogErrorKind::NoFramesFound {
                directory: directory.display().to_string(),
                pattern: pattern.to_string(),
            })
            .into());
        }

        matches.sort_by_cached_key(|(name, _)| (SequenceKey::new(name), name.clone()));
        debug!(count = matches.len(), "Found frames");

        let paths: Vec<PathBuf> = matches.into_iter().map(|(_, path)| path).collect();
        let frames = tokio::task::spawn_blocking(move || {
            paths
                .into_iter()
                .map(|path| {
                    let dimensions = read_dimensions(&path)?;
                    Ok(FrameFile::new(path, dimensions))
                })
                .collect::<Result<Vec<_>, CatalogError>>()
        })
        .await
        .map_err(|e| {
            CatalogError::new(CatalogErrorKind::DirectoryRead(format!(
                "{}: frame header task failed: {}",
                directory.display(),
                e
            )))
        })??;
        Ok(frames)
    }

    /// Compare each frame's size with the first frame's.
    ///
    /// Stops at the first mismatch, logging it. Returns `None` for an empty
    /// slice.
    pub fn check_consistency(&self, frames: &[FrameFile]) -> Option<ConsistencyReport> {
        let (first, rest) = frames.split_first()?;
        let reference = *first.dimensions();

        let divergent = rest.iter().find(|frame| *frame.dimensions() != reference);
        if let Some(frame) = divergent {
            warn!(
                path = %frame.path().display(),
                expected = %reference,
                actual = %frame.dimensions(),
                "Inconsistent frame dimensions"
            );
        }

        Some(ConsistencyReport {
            consistent: divergent.is_none(),
            reference,
            divergent: divergent.map(|frame| frame.path().clone()),
        })
    }
}

fn read_dimensions(path: &Path) -> Result<Dimensions, CatalogError> {
    let image_read = |message: String| {
        CatalogError::new(CatalogErrorKind::ImageRead {
            path: path.display().to_string(),
            message,
        })
    };
    ImageReader::open(path)
        .map_err(|e| image_read(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| image_read(e.to_string()))?
        .into_dimensions()
        .map(Dimensions::from)
        .map_err(|e| image_read(e.to_string()))
}

//! Turning an ordered frame set into one video file.

use crate::{FrameCatalog, FramePattern};
use flipbook_core::{AssembledVideo, Dimensions, EncodeRequest, FrameFile, VideoSpec};
use flipbook_error::{AssemblyError, AssemblyErrorKind, FlipbookResult};
use flipbook_interface::VideoEncoder;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// File name used when no output path is given.
pub const DEFAULT_OUTPUT_NAME: &str = "output.mp4";

/// Assembles frames into a video through an injected encoder.
///
/// Nothing here is retried: a failed call leaves earlier artifacts alone and
/// reports the failure.
#[derive(Debug, Clone)]
pub struct VideoAssembler<E> {
    encoder: E,
    catalog: FrameCatalog,
}

impl<E: VideoEncoder> VideoAssembler<E> {
    /// Assembler writing through `encoder`.
    pub fn new(encoder: E) -> Self {
        Self {
            encoder,
            catalog: FrameCatalog::new(),
        }
    }

    /// The injected encoder.
    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Encode `frames`, in the given order, to `output_path`.
    ///
    /// The resize target is `spec`'s explicit size if set; otherwise the
    /// first frame's size when frame sizes disagree; otherwise none. The
    /// encoder receives `fps / slowdown`, not the raw fps.
    ///
    /// # Errors
    ///
    /// - `NoFramesFound` for an empty slice
    /// - `InvalidParameter` for zero fps, slowdown below 1, a lone width or
    ///   height, or a zero-sized target
    /// - `OutputDirectory` if the output's parent cannot be created
    /// - whatever the encoder reports, typically `EncodingFailed`
    #[instrument(skip(self, frames), fields(frames = frames.len(), output = %output_path.display()))]
    pub async fn assemble(
        &self,
        frames: &[FrameFile],
        spec: &VideoSpec,
        output_path: &Path,
    ) -> FlipbookResult<AssembledVideo> {
        if frames.is_empty() {
            return Err(AssemblyError::new(AssemblyErrorKind::NoFramesFound).into());
        }

        let resize = self.resolve_resize(frames, spec)?;
        let effective_fps = effective_fps(spec)?;

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AssemblyError::new(AssemblyErrorKind::OutputDirectory(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let request = EncodeRequest::new(frames.to_vec(), effective_fps, resize, output_path);
        debug!(effective_fps, resize = ?resize, "Encoding frames");
        self.encoder.encode(&request).await?;

        let encoded_size = resize.or_else(|| frames.first().map(|f| *f.dimensions()));
        let video = AssembledVideo::new(output_path, frames.len(), effective_fps, encoded_size);
        info!(
            path = %video.output_path().display(),
            frame_count = video.frame_count(),
            duration_secs = video.duration_secs(),
            "Assembled video"
        );
        Ok(video)
    }

    /// Discover frames in `directory` and assemble them.
    ///
    /// `output_path` defaults to `<directory>/output.mp4`.
    #[instrument(skip(self, spec), fields(directory = %directory.display()))]
    pub async fn assemble_directory(
        &self,
        directory: &Path,
        pattern: &str,
        spec: &VideoSpec,
        output_path: Option<&Path>,
    ) -> FlipbookResult<AssembledVideo> {
        let pattern = FramePattern::parse(pattern)?;
        let frames = self.catalog.discover(directory, &pattern).await?;
        let output: PathBuf = output_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| directory.join(DEFAULT_OUTPUT_NAME));
        self.assemble(&frames, spec, &output).await
    }

    fn resolve_resize(
        &self,
        frames: &[FrameFile],
        spec: &VideoSpec,
    ) -> Result<Option<Dimensions>, AssemblyError> {
        match (spec.width(), spec.height()) {
            (Some(width), Some(height)) => {
                if *width == 0 || *height == 0 {
                    return Err(AssemblyError::new(AssemblyErrorKind::InvalidParameter(
                        format!("resize target must be non-zero, got {}x{}", width, height),
                    )));
                }
                Ok(Some(Dimensions::new(*width, *height)))
            }
            (None, None) => Ok(self
                .catalog
                .check_consistency(frames)
                .filter(|report| !report.consistent())
                .map(|report| {
                    info!(target_size = %report.reference(), "Resizing to first frame");
                    *report.reference()
                })),
            _ => Err(AssemblyError::new(AssemblyErrorKind::InvalidParameter(
                "width and height must be given together".to_string(),
            ))),
        }
    }
}

fn effective_fps(spec: &VideoSpec) -> Result<f64, AssemblyError> {
    if *spec.fps() == 0 {
        return Err(AssemblyError::new(AssemblyErrorKind::InvalidParameter(
            "fps must be positive".to_string(),
        )));
    }
    if *spec.slowdown() < 1 {
        return Err(AssemblyError::new(AssemblyErrorKind::InvalidParameter(format!(
            "slowdown must be at least 1, got {}",
            spec.slowdown()
        ))));
    }
    spec.effective_fps().ok_or_else(|| {
        AssemblyError::new(AssemblyErrorKind::InvalidParameter(
            "effective fps is undefined".to_string(),
        ))
    })
}

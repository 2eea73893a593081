//! Rendering prompts into frame files.

use crate::Stage;
use flipbook_error::{
    FlipbookError, FlipbookResult, OrchestrationError, OrchestrationErrorKind, UpstreamError,
    UpstreamErrorKind,
};
use flipbook_interface::ImageRenderer;
use flipbook_retry::RetryPolicy;
use flipbook_storage::ArchiveRecord;
use image::ImageFormat;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// File name of the rendered frame at 1-based `index`.
///
/// Zero-padded so that natural order and lexical order both match
/// generation order.
///
/// ```
/// assert_eq!(flipbook::frame_file_name(7), "frame_0007.png");
/// ```
pub fn frame_file_name(index: usize) -> String {
    format!("frame_{:04}.png", index)
}

/// Directory that frames for an archived run are rendered into.
///
/// `<frames_dir>/<run_id>/`, or `<frames_dir>/<record file stem>/` for
/// records written without a run id.
pub fn record_frames_dir(frames_dir: &Path, record_path: &Path, record: &ArchiveRecord) -> PathBuf {
    let subdir = record.run_id.clone().unwrap_or_else(|| {
        record_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    frames_dir.join(subdir)
}

/// Renders one image per prompt through the retry policy and writes them
/// as numbered frames.
#[derive(Clone)]
pub struct FrameRenderer {
    renderer: Arc<dyn ImageRenderer>,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl std::fmt::Debug for FrameRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRenderer")
            .field("model", &self.renderer.model_name())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl FrameRenderer {
    /// Renderer calling `renderer` under `retry`.
    pub fn new(renderer: Arc<dyn ImageRenderer>, retry: RetryPolicy) -> Self {
        Self {
            renderer,
            retry,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop rendering once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Model identifier of the underlying renderer.
    pub fn model_name(&self) -> &str {
        self.renderer.model_name()
    }

    /// Render `prompts` in order into `directory`.
    ///
    /// Rendering stops at the first prompt that cannot be rendered; the
    /// frames written before it are kept and returned.
    ///
    /// # Errors
    ///
    /// `NoUsableOutput` if nothing was rendered, `StageFailed` if the
    /// directory or a frame cannot be written.
    #[instrument(skip(self, prompts), fields(model = self.renderer.model_name(), prompts = prompts.len(), directory = %directory.display()))]
    pub async fn render_into(
        &self,
        prompts: &[&str],
        directory: &Path,
    ) -> FlipbookResult<Vec<PathBuf>> {
        tokio::fs::create_dir_all(directory).await.map_err(|e| {
            rendering_failed(0, format!("{}: {}", directory.display(), e))
        })?;

        let total = prompts.len();
        let mut written = Vec::with_capacity(total);
        for (offset, prompt) in prompts.iter().enumerate() {
            let index = offset + 1;
            if self.cancel.is_cancelled() {
                warn!(frame = index, total, "Rendering cancelled");
                break;
            }

            let renderer = &self.renderer;
            let outcome = self
                .retry
                .execute_cancellable(&self.cancel, || async move {
                    renderer.render(prompt).await.and_then(check_image)
                })
                .await;

            let bytes = match outcome {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(
                        frame = index,
                        total,
                        error = %e,
                        "Stopping rendering at first failed frame"
                    );
                    break;
                }
            };

            let path = directory.join(frame_file_name(index));
            tokio::fs::write(&path, &bytes).await.map_err(|e| {
                rendering_failed(written.len(), format!("{}: {}", path.display(), e))
            })?;
            info!(frame = index, total, path = %path.display(), "Rendered frame");
            written.push(path);
        }

        if written.is_empty() {
            return Err(OrchestrationError::new(OrchestrationErrorKind::NoUsableOutput {
                stage: Stage::Rendering.to_string(),
                salvaged: total,
            })
            .into());
        }
        if written.len() < total {
            warn!(rendered = written.len(), requested = total, "Rendering stopped early");
        }
        Ok(written)
    }

    /// Render the prompts of an archived record into
    /// [`record_frames_dir`]`(frames_dir, record_path, record)`.
    ///
    /// # Errors
    ///
    /// As [`FrameRenderer::render_into`].
    pub async fn render_record(
        &self,
        record_path: &Path,
        record: &ArchiveRecord,
        frames_dir: &Path,
    ) -> FlipbookResult<Vec<PathBuf>> {
        let prompts: Vec<&str> = record.prompts.iter().map(String::as_str).collect();
        let directory = record_frames_dir(frames_dir, record_path, record);
        self.render_into(&prompts, &directory).await
    }
}

/// Normalize a rendered payload to PNG bytes.
///
/// PNG passes through untouched; any other format the decoder knows is
/// transcoded so the bytes match the `.png` frame name. Payloads that are
/// not a recognizable image are rejected.
fn check_image(bytes: Vec<u8>) -> Result<Vec<u8>, UpstreamError> {
    let invalid = |message: String| UpstreamError::new(UpstreamErrorKind::InvalidResponse(message));

    let format = image::guess_format(&bytes)
        .map_err(|e| invalid(format!("rendered payload is not an image: {}", e)))?;
    if format == ImageFormat::Png {
        return Ok(bytes);
    }

    let decoded = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| invalid(format!("rendered {:?} payload cannot be decoded: {}", format, e)))?;
    let mut png = Cursor::new(Vec::new());
    decoded
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| invalid(format!("rendered {:?} payload cannot be re-encoded: {}", format, e)))?;
    debug!(from = ?format, "Transcoded rendered frame to PNG");
    Ok(png.into_inner())
}

fn rendering_failed(salvaged: usize, cause: String) -> FlipbookError {
    OrchestrationError::new(OrchestrationErrorKind::StageFailed {
        stage: Stage::Rendering.to_string(),
        salvaged,
        cause,
    })
    .into()
}

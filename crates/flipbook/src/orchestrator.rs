//! End-to-end generation: prompts, archive, images, frames, video.

use crate::{FlipbookConfig, FrameRenderer};
use derive_getters::Getters;
use flipbook_core::{AssembledVideo, GenerationRun, RunStatus, VideoSpec};
use flipbook_error::{FlipbookError, FlipbookResult, OrchestrationError, OrchestrationErrorKind};
use flipbook_interface::{ImageRenderer, PromptGenerator, VideoEncoder};
use flipbook_models::{GeminiClient, TogetherImageClient};
use flipbook_pipeline::SequentialPromptPipeline;
use flipbook_retry::RetryPolicy;
use flipbook_storage::PromptArchive;
use flipbook_video::{
    DEFAULT_OUTPUT_NAME, FfmpegEncoder, FrameCatalog, FramePattern, VideoAssembler,
};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Stages of a generation, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    /// Sequential prompt generation
    Prompts,
    /// Persisting the run
    Archive,
    /// Rendering one image per prompt
    Rendering,
    /// Discovering rendered frames
    Catalog,
    /// Encoding the video
    Assembly,
}

/// Everything a successful end-to-end generation produced.
#[derive(Debug, Clone, Getters)]
pub struct GenerationReport {
    /// The prompt run, including its terminal status
    run: GenerationRun,
    /// Archive record written for the run
    archive_path: PathBuf,
    /// Rendered frames in generation order
    frames: Vec<PathBuf>,
    /// The assembled video
    video: AssembledVideo,
}

impl GenerationReport {
    /// Terminal status of the prompt run.
    pub fn status(&self) -> RunStatus {
        *self.run.status()
    }

    /// Number of prompts the run produced.
    pub fn prompt_count(&self) -> usize {
        self.run.produced_prompts().len()
    }

    /// True when every requested prompt was produced and rendered.
    pub fn is_complete(&self) -> bool {
        self.status() == RunStatus::Completed && self.frames.len() == self.prompt_count()
    }
}

/// Wires the prompt pipeline, archive, image renderer and assembler together.
///
/// This is the only component that calls more than one stage. Each stage's
/// returned value is handed to the next; the first stage that yields nothing
/// usable stops the generation with an [`OrchestrationError`] naming the
/// stage and how many artifacts were salvaged.
pub struct GenerationOrchestrator {
    pipeline: SequentialPromptPipeline<Arc<dyn PromptGenerator>>,
    renderer: FrameRenderer,
    assembler: VideoAssembler<Arc<dyn VideoEncoder>>,
    catalog: FrameCatalog,
    archive: PromptArchive,
    frames_dir: PathBuf,
    pattern: FramePattern,
    spec: VideoSpec,
    output: Option<PathBuf>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for GenerationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationOrchestrator")
            .field("pipeline", &self.pipeline)
            .field("renderer", &self.renderer)
            .field("archive", &self.archive)
            .field("frames_dir", &self.frames_dir)
            .field("pattern", &self.pattern.as_str())
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl GenerationOrchestrator {
    /// Build an orchestrator around injected collaborators.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` does not validate.
    pub fn new(
        generator: Arc<dyn PromptGenerator>,
        renderer: Arc<dyn ImageRenderer>,
        encoder: Arc<dyn VideoEncoder>,
        config: &FlipbookConfig,
    ) -> FlipbookResult<Self> {
        config.validate()?;
        let retry = RetryPolicy::new(config.retry.clone());
        Ok(Self {
            pipeline: SequentialPromptPipeline::new(
                generator,
                retry.clone(),
                config.pipeline.clone(),
            ),
            renderer: FrameRenderer::new(renderer, retry),
            assembler: VideoAssembler::new(encoder),
            catalog: FrameCatalog::new(),
            archive: PromptArchive::new(&config.archive.root),
            frames_dir: config.frames.directory.clone(),
            pattern: FramePattern::parse(&config.frames.pattern)?,
            spec: config.video.spec(),
            output: config.video.output.clone(),
            cancel: CancellationToken::new(),
        })
    }

    /// Build an orchestrator with the Gemini, Together and ffmpeg backends.
    ///
    /// # Errors
    ///
    /// Fails if an API key is missing or the configuration is invalid.
    #[instrument(skip_all, fields(prompt_model = %config.models.prompt_model, image_model = %config.models.image.model))]
    pub fn from_config(config: &FlipbookConfig) -> FlipbookResult<Self> {
        let generator = GeminiClient::new(config.models.prompt_model.clone())?;
        let renderer = TogetherImageClient::new(config.models.image.clone())?;
        let encoder = FfmpegEncoder::new(config.video.ffmpeg.clone());
        Self::new(
            Arc::new(generator),
            Arc::new(renderer),
            Arc::new(encoder),
            config,
        )
    }

    /// Stop in-flight work when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.renderer = self.renderer.with_cancellation(token.clone());
        self.cancel = token;
        self
    }

    /// The prompt archive.
    pub fn archive(&self) -> &PromptArchive {
        &self.archive
    }

    /// Directory frames are rendered under and assembled from.
    pub fn frames_dir(&self) -> &Path {
        &self.frames_dir
    }

    /// Run every stage for `scene_description`.
    ///
    /// Frames are rendered into `<frames_dir>/<run_id>/` so earlier runs
    /// never leak into this run's video.
    ///
    /// # Errors
    ///
    /// An [`OrchestrationError`] naming the stage that stopped the run.
    #[instrument(skip(self, scene_description), fields(frames = frames.get()))]
    pub async fn generate(
        &self,
        scene_description: &str,
        frames: NonZeroUsize,
    ) -> FlipbookResult<GenerationReport> {
        let (run, archive_path) = self.generate_prompts(scene_description, frames).await?;

        let run_dir = self.frames_dir.join(run.run_id());
        let prompts = run.prompt_texts();
        let rendered = self.renderer.render_into(&prompts, &run_dir).await?;

        let catalog_frames = self
            .catalog
            .discover(&run_dir, &self.pattern)
            .await
            .map_err(|e| stage_failed(Stage::Catalog, rendered.len(), &e))?;

        let output = self
            .output
            .clone()
            .unwrap_or_else(|| run_dir.join(DEFAULT_OUTPUT_NAME));
        let video = self
            .assembler
            .assemble(&catalog_frames, &self.spec, &output)
            .await
            .map_err(|e| stage_failed(Stage::Assembly, rendered.len(), &e))?;

        let report = GenerationReport {
            run,
            archive_path,
            frames: rendered,
            video,
        };
        info!(
            status = %report.status(),
            prompts = report.prompt_count(),
            frames = report.frames().len(),
            video = %report.video().output_path().display(),
            "Generation finished"
        );
        Ok(report)
    }

    /// Run the prompt pipeline and archive its result.
    ///
    /// A partial run is archived and returned; a run with no prompts is not
    /// archived.
    ///
    /// # Errors
    ///
    /// `NoUsableOutput` at the prompts stage, or `StageFailed` at the
    /// archive stage.
    pub async fn generate_prompts(
        &self,
        scene_description: &str,
        frames: NonZeroUsize,
    ) -> FlipbookResult<(GenerationRun, PathBuf)> {
        archive_prompts(
            &self.pipeline,
            &self.archive,
            scene_description,
            frames,
            &self.cancel,
        )
        .await
    }
}

/// Run `pipeline` and archive its result.
///
/// A partial run is archived and returned; a run with no prompts stops here
/// and is not archived.
///
/// # Errors
///
/// `NoUsableOutput` at the prompts stage, or `StageFailed` at the archive
/// stage.
#[instrument(skip_all, fields(frames = frames.get(), archive = %archive.root().display()))]
pub async fn archive_prompts<G: PromptGenerator>(
    pipeline: &SequentialPromptPipeline<G>,
    archive: &PromptArchive,
    scene_description: &str,
    frames: NonZeroUsize,
    token: &CancellationToken,
) -> FlipbookResult<(GenerationRun, PathBuf)> {
    let run = pipeline
        .run_cancellable(scene_description, frames, token)
        .await;
    let produced = run.produced_prompts().len();
    if produced == 0 {
        if let Some(diagnostic) = run.diagnostic() {
            warn!(diagnostic = %diagnostic, "Prompt stage produced nothing");
        }
        return Err(no_usable_output(Stage::Prompts, 0));
    }

    let archive_path = archive
        .save(&run)
        .await
        .map_err(|e| stage_failed(Stage::Archive, produced, &e))?;
    info!(
        path = %archive_path.display(),
        prompts = produced,
        status = %run.status(),
        "Archived prompts"
    );
    Ok((run, archive_path))
}

fn stage_failed(stage: Stage, salvaged: usize, cause: &dyn std::fmt::Display) -> FlipbookError {
    OrchestrationError::new(OrchestrationErrorKind::StageFailed {
        stage: stage.to_string(),
        salvaged,
        cause: cause.to_string(),
    })
    .into()
}

fn no_usable_output(stage: Stage, salvaged: usize) -> FlipbookError {
    OrchestrationError::new(OrchestrationErrorKind::NoUsableOutput {
        stage: stage.to_string(),
        salvaged,
    })
    .into()
}

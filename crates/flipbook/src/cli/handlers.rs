//! Command handlers.

use super::Commands;
use flipbook::{
    FfmpegEncoder, FlipbookConfig, FlipbookResult, FrameRenderer, GeminiClient,
    GenerationOrchestrator, PromptArchive, RetryPolicy, SequentialPromptPipeline, StorageError,
    StorageErrorKind, TogetherImageClient, VideoAssembler, archive_prompts,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Run one CLI command with the resolved configuration.
pub async fn execute(
    command: Commands,
    config: FlipbookConfig,
    token: CancellationToken,
) -> FlipbookResult<()> {
    let config = config.with_overrides(&command.overrides())?;

    match command {
        Commands::Generate { scene, frames, .. } => {
            let orchestrator =
                GenerationOrchestrator::from_config(&config)?.with_cancellation(token);
            let report = orchestrator.generate(&scene, frames).await?;

            println!("Status:  {}", report.status());
            println!(
                "Prompts: {} of {}",
                report.prompt_count(),
                report.run().requested_frame_count()
            );
            println!("Archive: {}", report.archive_path().display());
            println!("Frames:  {}", report.frames().len());
            println!(
                "Video:   {} ({:.2}s at {} fps)",
                report.video().output_path().display(),
                report.video().duration_secs(),
                report.video().effective_fps()
            );
        }

        Commands::Prompts { scene, frames, .. } => {
            let generator = GeminiClient::new(config.models.prompt_model.clone())?;
            let pipeline = SequentialPromptPipeline::new(
                generator,
                RetryPolicy::new(config.retry.clone()),
                config.pipeline.clone(),
            );
            let archive = PromptArchive::new(&config.archive.root);
            let (run, path) = archive_prompts(&pipeline, &archive, &scene, frames, &token).await?;

            for prompt in run.produced_prompts() {
                println!("{:>3}. {}", prompt.index, prompt.text);
            }
            println!("Status:  {}", run.status());
            println!("Archive: {}", path.display());
        }

        Commands::Render { archive, .. } => {
            let renderer = TogetherImageClient::new(config.models.image.clone())?;
            let frames = FrameRenderer::new(
                Arc::new(renderer),
                RetryPolicy::new(config.retry.clone()),
            )
            .with_cancellation(token);
            let store = PromptArchive::new(&config.archive.root);
            let (path, record) = match archive {
                Some(path) => {
                    let record = store.load(&path).await?;
                    (path, record)
                }
                None => store.load_latest().await?,
            };

            info!(
                archive = %path.display(),
                prompts = record.prompts.len(),
                "Rendering archived prompts"
            );
            let written = frames
                .render_record(&path, &record, &config.frames.directory)
                .await?;
            for frame in &written {
                println!("{}", frame.display());
            }
        }

        Commands::Assemble { .. } => {
            let assembler = VideoAssembler::new(FfmpegEncoder::new(config.video.ffmpeg.clone()));
            let video = assembler
                .assemble_directory(
                    &config.frames.directory,
                    &config.frames.pattern,
                    &config.video.spec(),
                    config.video.output.as_deref(),
                )
                .await?;
            println!(
                "{} ({} frames, {:.2}s at {} fps)",
                video.output_path().display(),
                video.frame_count(),
                video.duration_secs(),
                video.effective_fps()
            );
        }

        Commands::Latest { show, .. } => {
            show_latest(&PromptArchive::new(&config.archive.root), show).await?;
        }
    }

    Ok(())
}

#[instrument(skip(archive), fields(root = %archive.root().display()))]
async fn show_latest(archive: &PromptArchive, show: bool) -> FlipbookResult<()> {
    if !show {
        println!("{}", archive.latest().await?.display());
        return Ok(());
    }
    let (path, record) = archive.load_latest().await?;
    let json = serde_json::to_string_pretty(&record).map_err(|e| {
        StorageError::new(StorageErrorKind::Serialization(format!(
            "Failed to format {}: {}",
            path.display(),
            e
        )))
    })?;
    println!("{}", path.display());
    println!("{}", json);
    Ok(())
}

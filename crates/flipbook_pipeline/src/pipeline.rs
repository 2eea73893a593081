//! The sequential prompt state machine.

use crate::prompts::{clean_response, initial_instruction, next_instruction};
use flipbook_core::{GenerationRun, PipelineState, RunStatus};
use flipbook_interface::PromptGenerator;
use flipbook_retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Pipeline knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum pause between successive frame generations, on top of any retry backoff
    pub inter_call_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inter_call_delay_ms: 500,
        }
    }
}

impl PipelineConfig {
    /// The inter-call delay as a [`Duration`].
    pub fn inter_call_delay(&self) -> Duration {
        Duration::from_millis(self.inter_call_delay_ms)
    }
}

/// Callback receiving every pipeline state transition.
pub type StateObserver = Arc<dyn Fn(PipelineState) + Send + Sync>;

/// Produces N frame prompts, each derived from the one before it.
///
/// The pipeline owns no run state between invocations; every call to
/// [`SequentialPromptPipeline::run`] starts a fresh [`GenerationRun`] with its
/// own retry counters.
pub struct SequentialPromptPipeline<G> {
    generator: G,
    retry: RetryPolicy,
    config: PipelineConfig,
    observer: Option<StateObserver>,
}

impl<G> std::fmt::Debug for SequentialPromptPipeline<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequentialPromptPipeline")
            .field("retry", &self.retry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<G: PromptGenerator> SequentialPromptPipeline<G> {
    /// Build a pipeline around an injected generator.
    pub fn new(generator: G, retry: RetryPolicy, config: PipelineConfig) -> Self {
        Self {
            generator,
            retry,
            config,
            observer: None,
        }
    }

    /// Report state transitions to `observer`.
    pub fn with_state_observer(mut self, observer: StateObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The injected generator.
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Generate `frames` prompts for `scene_description`.
    ///
    /// Never fails: the returned run is `Completed`, `PartiallyCompleted` or
    /// `Failed`, carrying the prompts accepted before any failure.
    pub async fn run(&self, scene_description: &str, frames: NonZeroUsize) -> GenerationRun {
        self.run_cancellable(scene_description, frames, &CancellationToken::new())
            .await
    }

    /// Like [`SequentialPromptPipeline::run`], stopping early once `token` is cancelled.
    ///
    /// Cancellation is observed between frames, during the inter-call delay,
    /// and inside remote calls and their backoff.
    #[instrument(skip(self, scene_description, token), fields(model = self.generator.model_name(), frames = frames.get()))]
    pub async fn run_cancellable(
        &self,
        scene_description: &str,
        frames: NonZeroUsize,
        token: &CancellationToken,
    ) -> GenerationRun {
        let total = frames.get();
        let mut run = GenerationRun::start(scene_description, frames);
        let mut diagnostic = None;
        self.transition(PipelineState::Init);

        for frame in 1..=total {
            let resumed = frame == 1 || self.pause(token).await;
            if !resumed || token.is_cancelled() {
                diagnostic = Some(format!("cancelled before frame {} of {}", frame, total));
                break;
            }

            self.transition(PipelineState::GeneratingFrame(frame));
            let instruction = match run.last_accepted() {
                None => initial_instruction(scene_description, total),
                Some(previous) => next_instruction(&previous.text, frame, total),
            };

            let generator = &self.generator;
            let instruction = instruction.as_str();
            let outcome = self
                .retry
                .execute_cancellable(token, || async move {
                    generator.generate(instruction).await.and_then(clean_response)
                })
                .await;

            match outcome {
                Ok(text) => {
                    info!(frame, total, chars = text.len(), "Accepted frame prompt");
                    run.accept(text);
                    self.transition(PipelineState::FrameAccepted(frame));
                }
                Err(e) => {
                    warn!(frame, total, error = %e, "Frame prompt generation failed");
                    self.transition(PipelineState::FrameFailed(frame));
                    diagnostic = Some(format!("frame {} of {}: {}", frame, total, e.kind));
                    break;
                }
            }
        }

        let status = run.finish(diagnostic);
        let terminal = match status {
            RunStatus::Completed => PipelineState::Completed,
            RunStatus::PartiallyCompleted => PipelineState::PartiallyCompleted,
            RunStatus::Failed | RunStatus::InProgress => PipelineState::Failed,
        };
        self.transition(terminal);

        if status != RunStatus::Completed {
            warn!(
                status = %status,
                produced = run.produced_prompts().len(),
                requested = total,
                diagnostic = run.diagnostic().as_deref().unwrap_or_default(),
                "Prompt pipeline stopped early"
            );
        }
        run
    }

    /// Wait out the inter-call delay. Returns false if cancelled meanwhile.
    async fn pause(&self, token: &CancellationToken) -> bool {
        let delay = self.config.inter_call_delay();
        if delay.is_zero() {
            return true;
        }
        tokio::select! {
            biased;
            _ = token.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    fn transition(&self, state: PipelineState) {
        debug!(state = %state, "Pipeline transition");
        if let Some(observer) = &self.observer {
            observer(state);
        }
    }
}

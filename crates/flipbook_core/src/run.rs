//! Generation runs and the prompts they accumulate.

use chrono::Utc;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Lifecycle of a generation run.
///
/// # Examples
///
/// ```
/// use flipbook_core::RunStatus;
///
/// assert!(RunStatus::Completed.is_terminal());
/// assert!(!RunStatus::InProgress.is_terminal());
/// assert_eq!(format!("{}", RunStatus::PartiallyCompleted), "partially_completed");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Prompts are still being generated
    #[display("in_progress")]
    InProgress,
    /// Terminated early with a non-empty prefix of the requested prompts
    #[display("partially_completed")]
    PartiallyCompleted,
    /// Every requested prompt was produced
    #[display("completed")]
    Completed,
    /// Terminated before the first prompt was accepted
    #[display("failed")]
    Failed,
}

impl RunStatus {
    /// Whether the run can no longer change.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::InProgress)
    }
}

/// States of the sequential prompt pipeline.
///
/// Frame indices are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum PipelineState {
    /// Nothing produced yet
    #[display("init")]
    Init,
    /// Waiting on the remote model for frame `i`
    #[display("generating_frame({})", _0)]
    GeneratingFrame(usize),
    /// Frame `i` was appended to the run
    #[display("frame_accepted({})", _0)]
    FrameAccepted(usize),
    /// Frame `i` could not be produced
    #[display("frame_failed({})", _0)]
    FrameFailed(usize),
    /// All frames produced
    #[display("completed")]
    Completed,
    /// Stopped early with at least one frame
    #[display("partially_completed")]
    PartiallyCompleted,
    /// Stopped before any frame was accepted
    #[display("failed")]
    Failed,
}

impl PipelineState {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Completed | PipelineState::PartiallyCompleted | PipelineState::Failed
        )
    }
}

/// One accepted frame description.
///
/// # Examples
///
/// ```
/// use flipbook_core::FramePrompt;
///
/// let first = FramePrompt { index: 1, text: "a seed on the wind".into(), derived_from: None };
/// assert!(first.derived_from.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePrompt {
    /// 1-based position in the sequence
    pub index: usize,
    /// The accepted prompt text
    pub text: String,
    /// Index of the prompt this one was derived from (`None` for the first)
    pub derived_from: Option<usize>,
}

/// A single invocation of the prompt pipeline.
///
/// Created in [`RunStatus::InProgress`]; prompts can only be appended while
/// in progress, and [`GenerationRun::finish`] settles the status from how many
/// prompts were produced. Once terminal, nothing changes.
///
/// # Examples
///
/// ```
/// use flipbook_core::{GenerationRun, RunStatus};
/// use std::num::NonZeroUsize;
///
/// let mut run = GenerationRun::start("a meadow", NonZeroUsize::new(3).unwrap());
/// run.accept("first frame");
/// run.accept("second frame");
/// assert_eq!(run.finish(Some("upstream gave up".into())), RunStatus::PartiallyCompleted);
/// assert_eq!(run.prompt_texts(), vec!["first frame", "second frame"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct GenerationRun {
    /// Opaque, timestamp-derived identifier
    run_id: String,
    /// The scene the run animates
    scene_description: String,
    /// How many prompts were asked for
    requested_frame_count: usize,
    /// Accepted prompts in order
    produced_prompts: Vec<FramePrompt>,
    /// Current lifecycle state
    status: RunStatus,
    /// Why the run stopped early, if it did
    diagnostic: Option<String>,
}

impl GenerationRun {
    /// Begin a new run with a fresh timestamp-derived id.
    pub fn start(scene_description: impl Into<String>, requested: NonZeroUsize) -> Self {
        let run_id = format!("run_{}", Utc::now().format("%Y%m%dT%H%M%S_%9f"));
        Self::with_run_id(run_id, scene_description, requested)
    }

    /// Begin a new run with an explicit id.
    pub fn with_run_id(
        run_id: impl Into<String>,
        scene_description: impl Into<String>,
        requested: NonZeroUsize,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            scene_description: scene_description.into(),
            requested_frame_count: requested.get(),
            produced_prompts: Vec::with_capacity(requested.get()),
            status: RunStatus::InProgress,
            diagnostic: None,
        }
    }

    /// Index the next accepted prompt will receive.
    pub fn next_index(&self) -> usize {
        self.produced_prompts.len() + 1
    }

    /// The most recently accepted prompt.
    pub fn last_accepted(&self) -> Option<&FramePrompt> {
        self.produced_prompts.last()
    }

    /// True once every requested prompt has been accepted.
    pub fn is_full(&self) -> bool {
        self.produced_prompts.len() >= self.requested_frame_count
    }

    /// Append the next prompt, derived from the previous accepted one.
    ///
    /// Returns `None` without changing anything if the run is terminal or
    /// already holds the requested number of prompts.
    pub fn accept(&mut self, text: impl Into<String>) -> Option<&FramePrompt> {
        if self.status.is_terminal() || self.is_full() {
            return None;
        }
        let index = self.next_index();
        self.produced_prompts.push(FramePrompt {
            index,
            text: text.into(),
            derived_from: index.checked_sub(1).filter(|prev| *prev > 0),
        });
        self.produced_prompts.last()
    }

    /// Settle the terminal status from the number of accepted prompts.
    ///
    /// A full run is `Completed`; a non-empty prefix is `PartiallyCompleted`;
    /// an empty one is `Failed`. The diagnostic is kept only for runs that
    /// stopped short. Calling this on a terminal run returns its status
    /// unchanged.
    pub fn finish(&mut self, diagnostic: Option<String>) -> RunStatus {
        if self.status.is_terminal() {
            return self.status;
        }
        self.status = if self.is_full() {
            RunStatus::Completed
        } else if self.produced_prompts.is_empty() {
            RunStatus::Failed
        } else {
            RunStatus::PartiallyCompleted
        };
        if self.status != RunStatus::Completed {
            self.diagnostic = diagnostic;
        }
        self.status
    }

    /// Prompt texts in frame order.
    pub fn prompt_texts(&self) -> Vec<&str> {
        self.produced_prompts.iter().map(|p| p.text.as_str()).collect()
    }
}

//! End-to-end generation error types.

/// Why an end-to-end generation stopped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum OrchestrationErrorKind {
    /// A stage raised an error
    #[display("Stage '{}' failed ({} artifacts salvaged): {}", stage, salvaged, cause)]
    StageFailed {
        /// Name of the stage that failed
        stage: String,
        /// Artifacts produced before the failure
        salvaged: usize,
        /// Underlying error message
        cause: String,
    },
    /// A stage finished but produced nothing the next stage could use
    #[display("Stage '{}' produced no usable output ({} artifacts salvaged)", stage, salvaged)]
    NoUsableOutput {
        /// Name of the empty stage
        stage: String,
        /// Artifacts produced by earlier stages
        salvaged: usize,
    },
}

/// Error type for the generation orchestrator.
///
/// # Examples
///
/// ```
/// use flipbook_error::{OrchestrationError, OrchestrationErrorKind};
///
/// let err = OrchestrationError::new(OrchestrationErrorKind::NoUsableOutput {
///     stage: "prompts".into(),
///     salvaged: 0,
/// });
/// assert!(format!("{}", err).contains("prompts"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Orchestration Error: {} at line {} in {}", kind, line, file)]
pub struct OrchestrationError {
    /// The specific error condition
    pub kind: OrchestrationErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl OrchestrationError {
    /// Create a new OrchestrationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: OrchestrationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Name of the stage that stopped the run.
    pub fn stage(&self) -> &str {
        match &self.kind {
            OrchestrationErrorKind::StageFailed { stage, .. } => stage,
            OrchestrationErrorKind::NoUsableOutput { stage, .. } => stage,
        }
    }

    /// Number of artifacts produced before the run stopped.
    pub fn salvaged(&self) -> usize {
        match &self.kind {
            OrchestrationErrorKind::StageFailed { salvaged, .. } => *salvaged,
            OrchestrationErrorKind::NoUsableOutput { salvaged, .. } => *salvaged,
        }
    }
}

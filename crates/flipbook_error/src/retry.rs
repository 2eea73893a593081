//! Errors produced by the retry policy.

use crate::UpstreamError;

/// Ways a retried call can end without a value.
#[derive(Debug, Clone, derive_more::Display)]
pub enum RetryErrorKind {
    /// Every attempt failed transiently and the retry budget ran out
    #[display("Retry budget exhausted after {} attempts: {}", attempts, last_cause)]
    Exhausted {
        /// Total number of calls made, including the first
        attempts: usize,
        /// The error returned by the final attempt
        last_cause: UpstreamError,
    },
    /// A permanent failure, surfaced without retrying
    #[display("Permanent failure on attempt {}: {}", attempt, cause)]
    Permanent {
        /// 1-based attempt number that failed
        attempt: usize,
        /// The permanent error
        cause: UpstreamError,
    },
    /// The surrounding run was cancelled while waiting
    #[display("Cancelled before attempt {} completed", _0)]
    Cancelled(usize),
}

/// Retry error with location tracking.
///
/// # Examples
///
/// ```
/// use flipbook_error::{RetryError, RetryErrorKind, UpstreamError, UpstreamErrorKind};
///
/// let last = UpstreamError::new(UpstreamErrorKind::RateLimited("slow down".into()));
/// let err = RetryError::new(RetryErrorKind::Exhausted { attempts: 4, last_cause: last });
/// assert!(err.is_exhausted());
/// assert!(format!("{}", err).contains("4 attempts"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Retry Error: {} at line {} in {}", kind, line, file)]
pub struct RetryError {
    /// The kind of error that occurred
    pub kind: RetryErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl RetryError {
    /// Create a new RetryError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RetryErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// True when the retry budget was spent on transient failures.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.kind, RetryErrorKind::Exhausted { .. })
    }

    /// The upstream error behind this failure, if any.
    pub fn cause(&self) -> Option<&UpstreamError> {
        match &self.kind {
            RetryErrorKind::Exhausted { last_cause, .. } => Some(last_cause),
            RetryErrorKind::Permanent { cause, .. } => Some(cause),
            RetryErrorKind::Cancelled(_) => None,
        }
    }
}

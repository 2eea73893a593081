//! Video assembly error types.

/// Specific error conditions for video assembly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum AssemblyErrorKind {
    /// The frame set was empty
    #[display("No frames to assemble")]
    NoFramesFound,
    /// A playback parameter is out of range
    #[display("Invalid parameter: {}", _0)]
    InvalidParameter(String),
    /// The output directory could not be created
    #[display("Failed to prepare output directory: {}", _0)]
    OutputDirectory(String),
    /// The media encoder failed
    #[display("Encoding failed: {}", _0)]
    EncodingFailed(String),
}

/// Error type for video assembly.
///
/// # Examples
///
/// ```
/// use flipbook_error::{AssemblyError, AssemblyErrorKind};
///
/// let err = AssemblyError::new(AssemblyErrorKind::InvalidParameter("slowdown must be >= 1".into()));
/// assert!(format!("{}", err).contains("slowdown"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Assembly Error: {} at line {} in {}", kind, line, file)]
pub struct AssemblyError {
    /// The specific error condition
    pub kind: AssemblyErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl AssemblyError {
    /// Create a new AssemblyError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: AssemblyErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

//! Frame discovery error types.

/// Specific error conditions for frame discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CatalogErrorKind {
    /// The frames directory does not exist
    #[display("Frames directory not found: {}", _0)]
    DirectoryNotFound(String),
    /// Nothing in the directory matched the pattern
    #[display("No frames found in {} matching pattern {}", directory, pattern)]
    NoFramesFound {
        /// Directory that was scanned
        directory: String,
        /// Glob pattern that was applied
        pattern: String,
    },
    /// The glob pattern could not be compiled
    #[display("Invalid frame pattern '{}': {}", pattern, message)]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Why it was rejected
        message: String,
    },
    /// Listing the directory failed
    #[display("Failed to read frames directory: {}", _0)]
    DirectoryRead(String),
    /// A frame image could not be opened or decoded
    #[display("Failed to read frame {}: {}", path, message)]
    ImageRead {
        /// Path of the frame
        path: String,
        /// Underlying decoder message
        message: String,
    },
}

/// Error type for frame discovery.
///
/// # Examples
///
/// ```
/// use flipbook_error::{CatalogError, CatalogErrorKind};
///
/// let err = CatalogError::new(CatalogErrorKind::DirectoryNotFound("outputs".into()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Catalog Error: {} at line {} in {}", kind, line, file)]
pub struct CatalogError {
    /// The specific error condition
    pub kind: CatalogErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl CatalogError {
    /// Create a new CatalogError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CatalogErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

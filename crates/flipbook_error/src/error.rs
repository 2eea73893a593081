//! Top-level error wrapper types.

use crate::{
    AssemblyError, CatalogError, ConfigError, OrchestrationError, RetryError, StorageError,
    UpstreamError,
};

/// Every error condition a Flipbook crate can report.
///
/// # Examples
///
/// ```
/// use flipbook_error::{FlipbookError, ConfigError};
///
/// let err: FlipbookError = ConfigError::new("bad fps").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum FlipbookErrorKind {
    /// Remote collaborator error
    #[from(UpstreamError)]
    Upstream(UpstreamError),
    /// Retry policy error
    #[from(RetryError)]
    Retry(RetryError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Archive storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Frame discovery error
    #[from(CatalogError)]
    Catalog(CatalogError),
    /// Video assembly error
    #[from(AssemblyError)]
    Assembly(AssemblyError),
    /// End-to-end generation error
    #[from(OrchestrationError)]
    Orchestration(OrchestrationError),
}

/// Flipbook error with kind discrimination.
///
/// # Examples
///
/// ```
/// use flipbook_error::{FlipbookErrorKind, FlipbookResult, StorageError, StorageErrorKind};
///
/// fn latest() -> FlipbookResult<()> {
///     Err(StorageError::new(StorageErrorKind::NotFound("archive".into())))?
/// }
///
/// let err = latest().unwrap_err();
/// assert!(matches!(err.kind(), FlipbookErrorKind::Storage(_)));
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Flipbook Error: {}", _0)]
pub struct FlipbookError(Box<FlipbookErrorKind>);

impl FlipbookError {
    /// Create a new error from a kind.
    pub fn new(kind: FlipbookErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &FlipbookErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to FlipbookErrorKind
impl<T> From<T> for FlipbookError
where
    T: Into<FlipbookErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Flipbook operations.
pub type FlipbookResult<T> = std::result::Result<T, FlipbookError>;

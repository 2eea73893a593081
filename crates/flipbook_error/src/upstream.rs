//! Errors raised by remote collaborators and their retry classification.

/// Failure conditions reported by a remote generation or rendering service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum UpstreamErrorKind {
    /// The service asked us to slow down
    #[display("Rate limited: {}", _0)]
    RateLimited(String),
    /// The service is temporarily unavailable
    #[display("Service unavailable: {}", _0)]
    Unavailable(String),
    /// Non-success HTTP status with response body
    #[display("HTTP {} error: {}", status_code, message)]
    HttpStatus {
        /// HTTP status code
        status_code: u16,
        /// Error message or response body
        message: String,
    },
    /// Connection, timeout or other transport failure
    #[display("Network error: {}", _0)]
    Network(String),
    /// The service refused the request (bad request, auth, policy)
    #[display("Request rejected: {}", _0)]
    Rejected(String),
    /// The reply could not be interpreted
    #[display("Invalid response: {}", _0)]
    InvalidResponse(String),
    /// Credentials are not configured
    #[display("{} environment variable not set", _0)]
    MissingApiKey(String),
}

impl UpstreamErrorKind {
    /// Whether this condition is expected to clear up on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamErrorKind::RateLimited(_)
            | UpstreamErrorKind::Unavailable(_)
            | UpstreamErrorKind::Network(_) => true,
            UpstreamErrorKind::HttpStatus { status_code, .. } => {
                matches!(*status_code, 408 | 429 | 500 | 502 | 503 | 504)
            }
            UpstreamErrorKind::Rejected(_)
            | UpstreamErrorKind::InvalidResponse(_)
            | UpstreamErrorKind::MissingApiKey(_) => false,
        }
    }
}

/// Upstream error with source location tracking.
///
/// # Examples
///
/// ```
/// use flipbook_error::{UpstreamError, UpstreamErrorKind};
///
/// let err = UpstreamError::new(UpstreamErrorKind::HttpStatus {
///     status_code: 503,
///     message: "overloaded".to_string(),
/// });
/// assert!(err.is_transient());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Upstream Error: {} at line {} in {}", kind, line, file)]
pub struct UpstreamError {
    /// The kind of error that occurred
    pub kind: UpstreamErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl UpstreamError {
    /// Create a new UpstreamError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: UpstreamErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for `self.kind.is_transient()`.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }

    /// Map an HTTP status and body onto the matching kind.
    ///
    /// 429 becomes [`UpstreamErrorKind::RateLimited`], 503 becomes
    /// [`UpstreamErrorKind::Unavailable`], 400/401/403/404 become
    /// [`UpstreamErrorKind::Rejected`]; everything else keeps its status.
    #[track_caller]
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = match status_code {
            429 => UpstreamErrorKind::RateLimited(message),
            503 => UpstreamErrorKind::Unavailable(message),
            400 | 401 | 403 | 404 => {
                UpstreamErrorKind::Rejected(format!("HTTP {}: {}", status_code, message))
            }
            _ => UpstreamErrorKind::HttpStatus {
                status_code,
                message,
            },
        };
        Self::new(kind)
    }
}

/// Trait for errors that support retry logic.
///
/// Transient errors like 503 (service unavailable), 429 (rate limit), or
/// network timeouts return true. Permanent errors like 401 (unauthorized)
/// or 400 (bad request) return false.
///
/// # Examples
///
/// ```
/// use flipbook_error::{RetryableError, UpstreamError, UpstreamErrorKind};
///
/// let err = UpstreamError::new(UpstreamErrorKind::Rejected("bad key".into()));
/// assert!(!err.is_retryable());
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    fn is_retryable(&self) -> bool;
}

impl RetryableError for UpstreamError {
    fn is_retryable(&self) -> bool {
        self.kind.is_transient()
    }
}

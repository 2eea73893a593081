//! Error types for the Flipbook workspace.
//!
//! This crate provides the foundation error types used by every Flipbook crate.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! The kinds map onto the pipeline's failure taxonomy:
//!
//! | Condition | Type |
//! |---|---|
//! | Rate limited / unavailable upstream | [`UpstreamErrorKind`] with `is_transient() == true` |
//! | Bad request / auth / malformed reply | [`UpstreamErrorKind`] with `is_transient() == false` |
//! | Transient failures outlasted the budget | [`RetryErrorKind::Exhausted`] |
//! | Bad parameter combinations | [`ConfigError`], [`AssemblyErrorKind::InvalidParameter`] |
//! | Missing directory, empty frame set | [`CatalogErrorKind`], [`AssemblyErrorKind::NoFramesFound`] |
//! | Media encoder failure | [`AssemblyErrorKind::EncodingFailed`] |
//!
//! # Examples
//!
//! ```
//! use flipbook_error::{FlipbookResult, ConfigError};
//!
//! fn load() -> FlipbookResult<String> {
//!     Err(ConfigError::new("frame count must be positive"))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assembly;
mod catalog;
mod config;
mod error;
mod orchestration;
mod retry;
mod storage;
mod upstream;

pub use assembly::{AssemblyError, AssemblyErrorKind};
pub use catalog::{CatalogError, CatalogErrorKind};
pub use config::ConfigError;
pub use error::{FlipbookError, FlipbookErrorKind, FlipbookResult};
pub use orchestration::{OrchestrationError, OrchestrationErrorKind};
pub use retry::{RetryError, RetryErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use upstream::{RetryableError, UpstreamError, UpstreamErrorKind};

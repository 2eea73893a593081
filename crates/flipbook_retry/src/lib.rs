//! Retry with exponential backoff for calls to remote collaborators.
//!
//! [`RetryPolicy`] absorbs transient upstream failures (rate limits, service
//! unavailable, network hiccups) and surfaces everything else immediately.
//! Each call to [`RetryPolicy::execute`] gets its own attempt counter.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod policy;

pub use config::RetryConfig;
pub use policy::{RetryAttempt, RetryObserver, RetryPolicy};

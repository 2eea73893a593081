//! The retry loop.

use crate::RetryConfig;
use flipbook_error::{RetryError, RetryErrorKind, RetryableError, UpstreamError};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_retry2::{Retry, RetryError as Backoff};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Progress signal emitted before each retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryAttempt {
    /// 1-based number of the call that just failed
    pub attempt: usize,
    /// How long the policy will wait before the next call
    pub delay: Duration,
    /// Rendered cause of the failure
    pub cause: String,
}

/// Callback receiving [`RetryAttempt`]s. Must return quickly.
pub type RetryObserver = Arc<dyn Fn(&RetryAttempt) + Send + Sync>;

/// Retries transient upstream failures with exponential backoff and jitter.
///
/// Permanent failures are returned on the attempt they occur. When the retry
/// budget runs out the last transient cause is wrapped in
/// [`RetryErrorKind::Exhausted`].
///
/// # Examples
///
/// ```
/// use flipbook_error::{UpstreamError, UpstreamErrorKind};
/// use flipbook_retry::{RetryConfig, RetryPolicy};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let policy = RetryPolicy::new(RetryConfig::immediate(2));
/// let calls = AtomicUsize::new(0);
/// let value = policy
///     .execute(|| async {
///         if calls.fetch_add(1, Ordering::SeqCst) < 2 {
///             Err(UpstreamError::new(UpstreamErrorKind::RateLimited("busy".into())))
///         } else {
///             Ok("done")
///         }
///     })
///     .await
///     .unwrap();
/// assert_eq!(value, "done");
/// assert_eq!(calls.load(Ordering::SeqCst), 3);
/// # }
/// ```
#[derive(Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    observer: Option<RetryObserver>,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("config", &self.config)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Policy with the given knobs and no observer.
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    /// Attach a progress observer.
    pub fn with_observer(mut self, observer: RetryObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The backoff knobs.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails permanently, or the budget is spent.
    #[instrument(skip_all, fields(max_retries = self.config.max_retries))]
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, RetryError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let attempts = AtomicUsize::new(0);
        self.run(&attempts, operation).await
    }

    /// Like [`RetryPolicy::execute`], but gives up as soon as `token` is cancelled.
    ///
    /// Cancellation interrupts both in-flight calls and backoff sleeps.
    #[instrument(skip_all, fields(max_retries = self.config.max_retries))]
    pub async fn execute_cancellable<T, F, Fut>(
        &self,
        token: &CancellationToken,
        operation: F,
    ) -> Result<T, RetryError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let attempts = AtomicUsize::new(0);
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                let attempt = attempts.load(Ordering::SeqCst);
                debug!(attempt, "Retry loop cancelled");
                Err(RetryError::new(RetryErrorKind::Cancelled(attempt)))
            }
            result = self.run(&attempts, operation) => result,
        }
    }

    async fn run<T, F, Fut>(&self, attempts: &AtomicUsize, operation: F) -> Result<T, RetryError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let delays = self.config.delays();
        let schedule = &delays;
        let operation = &operation;

        let outcome = Retry::spawn(delays.clone(), move || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let call = operation();
            async move {
                match call.await {
                    Ok(value) => Ok(value),
                    Err(e) if e.is_retryable() => {
                        if let Some(delay) = schedule.get(attempt - 1) {
                            self.notify(&RetryAttempt {
                                attempt,
                                delay: *delay,
                                cause: e.to_string(),
                            });
                        }
                        Err(Backoff::Transient {
                            err: e,
                            retry_after: None,
                        })
                    }
                    Err(e) => {
                        warn!(attempt, error = %e, "Permanent upstream error, not retrying");
                        Err(Backoff::Permanent(e))
                    }
                }
            }
        })
        .await;

        let made = attempts.load(Ordering::SeqCst);
        outcome.map_err(|cause| {
            if cause.is_retryable() {
                warn!(attempts = made, error = %cause, "Retry budget exhausted");
                RetryError::new(RetryErrorKind::Exhausted {
                    attempts: made,
                    last_cause: cause,
                })
            } else {
                RetryError::new(RetryErrorKind::Permanent {
                    attempt: made,
                    cause,
                })
            }
        })
    }

    fn notify(&self, attempt: &RetryAttempt) {
        warn!(
            attempt = attempt.attempt,
            delay_ms = attempt.delay.as_millis() as u64,
            error = %attempt.cause,
            "Transient upstream error, will retry"
        );
        if let Some(observer) = &self.observer {
            observer(attempt);
        }
    }
}

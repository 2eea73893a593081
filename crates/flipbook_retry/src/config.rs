//! Retry knobs.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_retry2::strategy::jitter_range;

/// Backoff parameters.
///
/// The wait before retry `n` (0-based) is
/// `min(base_delay_ms * 2^n, max_delay_ms) + U[0, jitter_ms)`.
///
/// ```toml
/// [retry]
/// max_retries = 3
/// base_delay_ms = 1000
/// jitter_ms = 1000
/// max_delay_ms = 60000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first call; `r` allows up to `r + 1` calls
    pub max_retries: usize,
    /// Delay before the first retry
    pub base_delay_ms: u64,
    /// Upper bound of the uniform jitter added to every delay
    pub jitter_ms: u64,
    /// Cap on the exponential part of the delay
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            jitter_ms: 1000,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryConfig {
    /// Config that retries `max_retries` times without waiting.
    pub fn immediate(max_retries: usize) -> Self {
        Self {
            max_retries,
            base_delay_ms: 0,
            jitter_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Exponential part of the delay before retry `attempt` (0-based).
    pub fn backoff(&self, attempt: usize) -> Duration {
        let factor = u32::try_from(attempt)
            .ok()
            .and_then(|exp| 2u64.checked_pow(exp))
            .unwrap_or(u64::MAX);
        let millis = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(millis)
    }

    /// Draw the full delay schedule for one logical call.
    pub fn delays(&self) -> Vec<Duration> {
        let jitter = jitter_range(0.0, 1.0);
        (0..self.max_retries)
            .map(|attempt| self.backoff(attempt) + jitter(Duration::from_millis(self.jitter_ms)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_until_cap() {
        let config = RetryConfig {
            max_retries: 10,
            base_delay_ms: 100,
            jitter_ms: 0,
            max_delay_ms: 1000,
        };
        let millis: Vec<u128> = config.delays().iter().map(Duration::as_millis).collect();
        assert_eq!(millis, vec![100, 200, 400, 800, 1000, 1000, 1000, 1000, 1000, 1000]);
    }

    #[test]
    fn test_jitter_never_shortens_backoff() {
        let config = RetryConfig {
            max_retries: 20,
            base_delay_ms: 10,
            jitter_ms: 50,
            max_delay_ms: 10,
        };
        for delay in config.delays() {
            assert!(delay >= Duration::from_millis(10));
        }
    }

    #[test]
    fn test_jitter_stays_below_bound() {
        let config = RetryConfig {
            max_retries: 2000,
            base_delay_ms: 0,
            jitter_ms: 1000,
            max_delay_ms: 0,
        };
        let delays = config.delays();
        assert!(delays.iter().all(|d| *d < Duration::from_millis(1000)));
        assert!(delays.iter().any(|d| *d < Duration::from_millis(500)));
    }

    #[test]
    fn test_huge_attempt_saturates() {
        let config = RetryConfig::default();
        assert_eq!(config.backoff(200), Duration::from_millis(60_000));
    }
}

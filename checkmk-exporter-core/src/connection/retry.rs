//! Dial retry with exponential backoff
//!
//! Retries are off unless configured: a failed dial normally ends the scrape.
//! When enabled, only transient failures (see
//! [`ConnectionError::is_transient`](crate::error::ConnectionError::is_transient))
//! are retried.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default maximum number of retry attempts once enabled
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Default initial delay between retries in milliseconds
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 500;

/// Default maximum delay between retries in milliseconds
pub const DEFAULT_MAX_DELAY_MS: u64 = 5_000;

/// Default backoff multiplier (delay doubles each retry)
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Configuration for dial retry behavior
///
/// The delay before retry `n` (0-indexed) is
/// `min(initial_delay * multiplier^n, max_delay)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Whether retry is enabled
    pub enabled: bool,
    /// Maximum number of retry attempts (0 = no retries)
    pub max_attempts: u32,
    /// Initial delay between retries in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryConfig {
    /// Creates an enabled configuration with default backoff parameters
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Sets the maximum number of retry attempts
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the initial delay between retries
    #[must_use]
    pub const fn with_initial_delay_ms(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self
    }

    /// Sets the maximum delay between retries
    #[must_use]
    pub const fn with_max_delay_ms(mut self, delay_ms: u64) -> Self {
        self.max_delay_ms = delay_ms;
        self
    }

    /// Sets the backoff multiplier
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculates the delay for a given retry number (0-indexed)
    ///
    /// Returns `None` if retry is disabled or the attempts are exhausted.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if !self.should_retry(attempt) {
            return None;
        }

        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_ms = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped_delay_ms = (delay_ms as u64).min(self.max_delay_ms);

        Some(Duration::from_millis(capped_delay_ms))
    }

    /// Returns whether another retry should be attempted
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        self.enabled && attempt < self.max_attempts
    }

    /// Returns the total number of attempts (initial + retries)
    #[must_use]
    pub const fn total_attempts(&self) -> u32 {
        if self.enabled {
            self.max_attempts + 1
        } else {
            1
        }
    }
}

//! Remote command execution
//!
//! A [`ConnectionProvider`] opens one channel to a [`Target`], runs the agent
//! command once and hands back everything it printed. The SSH implementation
//! lives in [`ssh_exec`]; tests drive the scrape pipeline with in-memory
//! providers instead.

mod retry;
pub mod ssh_exec;

use async_trait::async_trait;

use crate::config::Target;
use crate::error::ConnectionResult;

pub use retry::{
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_DELAY_MS, RetryConfig,
};
pub use ssh_exec::{SshConnectionProvider, validate_private_key};

/// Complete stdout of one agent run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput(String);

impl RawOutput {
    /// Returns the captured text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RawOutput {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for RawOutput {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

/// Fetches raw agent output from a target
///
/// Implementations open a fresh channel for every call and release it
/// before returning; nothing is pooled between calls.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Runs the agent command on `target` and returns its stdout.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`](crate::error::ConnectionError) for any
    /// failure between reading the key and collecting the output.
    async fn fetch(&self, target: &Target) -> ConnectionResult<RawOutput>;
}

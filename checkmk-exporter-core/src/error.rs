//! Error types for the exporter core
//!
//! Each pipeline stage has its own error enum. Only [`ConfigError`] is fatal;
//! connection errors turn a scrape into an empty one, decoder errors exclude a
//! single subsystem, and request errors are reported back to the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while fetching raw agent output from a target
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The private key could not be read or is unusable (bad key, passphrase, rejected)
    #[error("Authentication failed for '{path}': {reason}")]
    Authentication {
        /// Path of the private key file
        path: String,
        /// Why the key was not usable
        reason: String,
    },

    /// The TCP/SSH connection could not be established
    #[error("Unable to connect to {host}:{port}: {reason}")]
    Dial {
        /// Remote host
        host: String,
        /// Remote port
        port: u16,
        /// Transport error message
        reason: String,
    },

    /// The remote host key did not pass verification
    #[error("Host key verification failed for {host}: {reason}")]
    HostKeyRejected {
        /// Remote host
        host: String,
        /// Verification error message
        reason: String,
    },

    /// The local ssh client could not be started
    #[error("Failed to create session: {0}")]
    Session(String),

    /// The remote command failed or produced no usable output
    #[error("Command '{command}' failed: {reason}")]
    CommandExecution {
        /// Command that was executed
        command: String,
        /// Exit status or stream problem
        reason: String,
    },

    /// The configured command timeout elapsed
    #[error("Command timed out after {0}s")]
    Timeout(u64),
}

impl ConnectionError {
    /// Returns whether the failure may go away on a second attempt.
    ///
    /// Only dial failures qualify. Anything later has already run the agent
    /// on the host, so it is never repeated.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Dial { .. })
    }

    /// Short stage label used in logs and scrape-status metrics
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "authentication",
            Self::Dial { .. } | Self::HostKeyRejected { .. } => "connect",
            Self::Session(_) => "session",
            Self::CommandExecution { .. } | Self::Timeout(_) => "command",
        }
    }
}

/// Result type for connection operations
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// Errors raised by decoder factories and decoders
#[derive(Debug, Error)]
pub enum DecoderError {
    /// A factory could not build its decoder
    #[error("Unable to initialize factory for collector '{subsystem}': {reason}")]
    Factory {
        /// Subsystem name the factory is registered under
        subsystem: String,
        /// Failure reason
        reason: String,
    },

    /// The sample sink was closed before the decoder finished
    #[error("Sample sink closed while decoding '{0}'")]
    SinkClosed(String),

    /// The decode task did not run to completion
    #[error("Decoder '{subsystem}' aborted: {reason}")]
    Aborted {
        /// Subsystem whose task aborted
        subsystem: String,
        /// Join error message
        reason: String,
    },
}

/// Result type for decoder operations
pub type DecoderResult<T> = Result<T, DecoderError>;

/// Errors raised while loading the targets file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Unable to open '{path}': {source}")]
    Read {
        /// Path of the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML for the expected layout
    #[error("Unable to parse '{path}': {reason}")]
    Parse {
        /// Path of the config file
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// A target entry is unusable
    #[error("Invalid target '{name}': {reason}")]
    InvalidTarget {
        /// Target name
        name: String,
        /// Validation message
        reason: String,
    },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Request-level errors that are reported to the scrape caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrapeError {
    /// No target name was supplied
    #[error("'target' parameter must be specified")]
    MissingTarget,

    /// The target name is not in the configuration
    #[error("Unknown target '{0}'")]
    UnknownTarget(String),
}

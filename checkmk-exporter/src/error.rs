//! CLI error types and exit codes.

use checkmk_exporter_core::{ConfigError, LoggingError};

/// Exit codes for the exporter process
pub mod exit_codes {
    /// Startup error: configuration or logging setup
    pub const CONFIG_FAILURE: i32 = 1;
    /// Server error: bind failure or the server stopped unexpectedly
    pub const SERVER_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Targets file could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging could not be initialized
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// Exporter metrics could not be registered
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Runtime, bind or serve failure
    #[error("Server error: {0}")]
    Server(String),
}

impl CliError {
    /// Returns the process exit code for this error.
    ///
    /// - 1: configuration or logging setup failed
    /// - 2: the HTTP server could not start or stopped
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Logging(_) => exit_codes::CONFIG_FAILURE,
            Self::Metrics(_) | Self::Server(_) => exit_codes::SERVER_FAILURE,
        }
    }
}

//! Logging setup
//!
//! Wires `tracing` to a `tracing-subscriber` registry with an [`EnvFilter`]
//! and a `fmt` layer. `RUST_LOG`, when set, takes precedence over the
//! configured level.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Crates whose events follow the configured level; everything else logs at warn
const OWN_TARGETS: &[&str] = &["checkmk_exporter_core", "checkmk_exporter"];

/// Errors that can occur during logging initialization
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Unknown level name
    #[error("Invalid log level '{0}', expected one of error, warn, info, debug, trace")]
    InvalidLevel(String),

    /// Filter directive did not parse
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    /// Subscriber could not be installed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// Logging was set up before
    #[error("Logging has already been initialized")]
    AlreadyInitialized,

    /// Log file could not be created
    #[error("Failed to create log file: {0}")]
    FileCreationFailed(String),
}

/// Result type for logging operations
pub type LoggingResult<T> = Result<T, LoggingError>;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Errors and warnings
    Warn,
    /// Default level
    #[default]
    Info,
    /// Section names, command lines, per-scrape summaries
    Debug,
    /// Raw agent output
    Trace,
}

impl LogLevel {
    /// Converts to the `tracing` level
    #[must_use]
    pub const fn to_tracing_level(self) -> Level {
        match self {
            Self::Error => Level::ERROR,
            Self::Warn => Level::WARN,
            Self::Info => Level::INFO,
            Self::Debug => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoggingOutput {
    /// Standard output
    Stdout,
    /// Standard error
    #[default]
    Stderr,
    /// Plain-text file, truncated on start
    File(PathBuf),
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level for the exporter's own crates
    pub level: LogLevel,
    /// Destination
    pub output: LoggingOutput,
    /// Full filter directive, replaces `level` when set
    pub filter: Option<String>,
}

impl LoggingConfig {
    /// Creates a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the log level
    #[must_use]
    pub const fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the output destination
    #[must_use]
    pub fn with_output(mut self, output: LoggingOutput) -> Self {
        self.output = output;
        self
    }

    /// Sets a custom filter directive
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Filter directive derived from the configuration
    #[must_use]
    pub fn directive(&self) -> String {
        if let Some(filter) = &self.filter {
            return filter.clone();
        }
        let mut directive = String::from("warn");
        for target in OWN_TARGETS {
            directive.push_str(&format!(",{target}={}", self.level));
        }
        directive
    }

    fn env_filter(&self) -> LoggingResult<EnvFilter> {
        if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some()
            && let Ok(filter) = EnvFilter::try_from_default_env()
        {
            return Ok(filter);
        }
        EnvFilter::try_new(self.directive()).map_err(|e| LoggingError::InvalidFilter(e.to_string()))
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns an error if logging was already initialized, the filter is
/// invalid, or the log file cannot be created.
pub fn init_logging(config: &LoggingConfig) -> LoggingResult<()> {
    if LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(LoggingError::AlreadyInitialized);
    }

    let filter = config.env_filter()?;
    let (writer, ansi) = match &config.output {
        LoggingOutput::Stdout => (BoxMakeWriter::new(std::io::stdout), true),
        LoggingOutput::Stderr => (BoxMakeWriter::new(std::io::stderr), true),
        LoggingOutput::File(path) => {
            let file = std::fs::File::create(path)
                .map_err(|e| LoggingError::FileCreationFailed(format!("{}: {e}", path.display())))?;
            (BoxMakeWriter::new(file), false)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(ansi)
                .with_writer(writer),
        )
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;

    tracing::debug!(level = %config.level, "Logging initialized");
    Ok(())
}

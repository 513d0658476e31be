//! check_mk exporter core library
//!
//! Runs `check_mk_agent` on remote hosts over SSH, splits the output into
//! subsystem sections and decodes them into Prometheus gauge samples.
//!
//! # Crate Structure
//!
//! - [`config`] - Targets file and SSH provider settings
//! - [`connection`] - `ConnectionProvider` trait and the SSH implementation
//! - [`sections`] - `<<<name>>>` section demultiplexer
//! - [`decoder`] - `SubsystemDecoder` trait, registry and the `df`/`diskstat` decoders
//! - [`scrape`] - Scrape orchestration and per-scrape reports
//! - [`exposition`] - Prometheus text rendering
//! - [`logging`] - `tracing` subscriber setup
//! - [`error`] - Error types

#![warn(missing_docs)]

pub mod config;
pub mod connection;
pub mod decoder;
pub mod error;
pub mod exposition;
pub mod logging;
pub mod scrape;
pub mod sections;

pub use config::{ExporterConfig, HostKeyVerification, SshSettings, Target, TargetOverrides};
pub use connection::{ConnectionProvider, RawOutput, RetryConfig, SshConnectionProvider};
pub use decoder::{
    DecoderRegistry, MetricDesc, MetricSample, SampleSink, SubsystemDecoder, drain_samples,
};
pub use error::{
    ConfigError, ConfigResult, ConnectionError, ConnectionResult, DecoderError, DecoderResult,
    ScrapeError,
};
pub use logging::{LogLevel, LoggingConfig, LoggingError, LoggingOutput, init_logging};
pub use scrape::{CollectorOutcome, ScrapeFailure, ScrapeOrchestrator, ScrapeReport};
pub use sections::{SectionMap, demux};

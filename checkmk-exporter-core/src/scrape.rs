//! Scrape orchestration
//!
//! One scrape: fetch the agent output, split it into sections, run one
//! decode task per registered subsystem that has a section, then wait for
//! all of them. Failures are recorded in the returned [`ScrapeReport`];
//! nothing here aborts the caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;

use crate::config::Target;
use crate::connection::ConnectionProvider;
use crate::decoder::{DecoderRegistry, SampleSink};
use crate::error::DecoderError;
use crate::sections::demux;

/// Why a scrape produced no subsystem samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeFailure {
    /// Pipeline stage that failed, e.g. `"connect"`
    pub stage: &'static str,
    /// Error message
    pub message: String,
}

/// Result of one decoder within a scrape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorOutcome {
    /// Subsystem name
    pub subsystem: String,
    /// Error message if the decoder did not finish cleanly
    pub error: Option<String>,
}

impl CollectorOutcome {
    /// Returns true if the decoder finished without error
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of one scrape
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    /// Host that was scraped
    pub target: String,
    /// Wall-clock start time
    pub started_at: DateTime<Utc>,
    /// Time from start until every decode task finished
    pub duration: Duration,
    /// Set when the connection stage failed
    pub failure: Option<ScrapeFailure>,
    /// One entry per decoder that ran or failed to build
    pub collectors: Vec<CollectorOutcome>,
}

impl ScrapeReport {
    fn new(target: &Target) -> Self {
        Self {
            target: target.host_name.clone(),
            started_at: Utc::now(),
            duration: Duration::ZERO,
            failure: None,
            collectors: Vec::new(),
        }
    }

    /// Returns true if the agent output was fetched
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Looks up the outcome of one decoder
    #[must_use]
    pub fn collector(&self, subsystem: &str) -> Option<&CollectorOutcome> {
        self.collectors.iter().find(|c| c.subsystem == subsystem)
    }
}

/// Runs scrapes against a connection provider and a decoder registry
#[derive(Clone)]
pub struct ScrapeOrchestrator {
    provider: Arc<dyn ConnectionProvider>,
    registry: Arc<DecoderRegistry>,
}

impl std::fmt::Debug for ScrapeOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrapeOrchestrator")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl ScrapeOrchestrator {
    /// Creates an orchestrator
    #[must_use]
    pub fn new(provider: Arc<dyn ConnectionProvider>, registry: Arc<DecoderRegistry>) -> Self {
        Self { provider, registry }
    }

    /// Scrapes `target` and writes every decoded sample into `sink`.
    ///
    /// Returns once all decode tasks have finished. On a connection failure
    /// nothing is written and the report carries the failing stage.
    pub async fn collect(&self, target: &Target, sink: &SampleSink) -> ScrapeReport {
        let clock = Instant::now();
        let mut report = ScrapeReport::new(target);

        let raw = match self.provider.fetch(target).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    host = %target.address(),
                    stage = e.stage(),
                    error = %e,
                    "Scrape failed"
                );
                report.failure = Some(ScrapeFailure {
                    stage: e.stage(),
                    message: e.to_string(),
                });
                report.duration = clock.elapsed();
                return report;
            }
        };

        let mut sections = demux(raw.as_str());
        let decoders = self.registry.instantiate();
        for (subsystem, e) in decoders.failed() {
            report.collectors.push(CollectorOutcome {
                subsystem: subsystem.clone(),
                error: Some(e.to_string()),
            });
        }
        sections.retain(|name| decoders.contains(name));

        let mut names = Vec::with_capacity(sections.len());
        let mut tasks = Vec::with_capacity(sections.len());
        for (subsystem, decoder) in decoders.iter() {
            let Some(lines) = sections.take(subsystem) else {
                tracing::debug!(subsystem, "No section in agent output");
                continue;
            };
            let decoder = Arc::clone(decoder);
            let sink = sink.clone();
            names.push(subsystem.to_string());
            tasks.push(tokio::spawn(async move { decoder.update(&lines, &sink) }));
        }

        for (subsystem, joined) in names.into_iter().zip(join_all(tasks).await) {
            let result = joined.unwrap_or_else(|e| {
                Err(DecoderError::Aborted {
                    subsystem: subsystem.clone(),
                    reason: e.to_string(),
                })
            });
            let error = result.err().map(|e| {
                tracing::warn!(subsystem = %subsystem, error = %e, "Decoder failed");
                e.to_string()
            });
            report.collectors.push(CollectorOutcome { subsystem, error });
        }

        report.duration = clock.elapsed();
        tracing::debug!(
            host = %target.address(),
            duration_secs = report.duration.as_secs_f64(),
            collectors = report.collectors.len(),
            "Scrape finished"
        );
        report
    }
}

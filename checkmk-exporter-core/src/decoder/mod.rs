//! Subsystem decoders
//!
//! A [`SubsystemDecoder`] turns the raw lines of one agent section into
//! [`MetricSample`]s and writes them into a [`SampleSink`]. Decoders are
//! created per scrape by the [`DecoderRegistry`]; adding a subsystem means
//! adding one decoder type and one registration.
//!
//! Shared parsing policy:
//! - lines are split on whitespace into positional fields
//! - a numeric field that does not parse counts as `0.0`
//! - a line with fewer fields than the decoder needs is skipped

pub mod df;
pub mod diskstat;
mod registry;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{DecoderError, DecoderResult};

pub use df::FilesystemUsage;
pub use diskstat::BlockDeviceIo;
pub use registry::{DecoderFactory, DecoderRegistry, DecoderSet};

/// Metric namespace shared by all decoders
pub const NAMESPACE: &str = "check_mk";

/// Joins the non-empty parts of a metric name with `_`
#[must_use]
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Parses a numeric field, `0.0` when it is not a number
#[must_use]
pub fn parse_value(field: &str) -> f64 {
    field.parse().unwrap_or(0.0)
}

/// Name, help text and label names of one metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDesc {
    /// Fully-qualified metric name
    pub fq_name: String,
    /// Help text
    pub help: String,
    /// Label names, in the order label values are given
    pub label_names: &'static [&'static str],
}

impl MetricDesc {
    /// Creates a descriptor under [`NAMESPACE`]
    #[must_use]
    pub fn new(
        subsystem: &str,
        name: &str,
        help: impl Into<String>,
        label_names: &'static [&'static str],
    ) -> Arc<Self> {
        Arc::new(Self {
            fq_name: build_fq_name(NAMESPACE, subsystem, name),
            help: help.into(),
            label_names,
        })
    }
}

/// One decoded gauge value with its labels
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// Descriptor shared by all samples of the metric
    pub desc: Arc<MetricDesc>,
    /// Label values, aligned with `desc.label_names`
    pub label_values: Vec<String>,
    /// Sample value
    pub value: f64,
}

impl MetricSample {
    /// Fully-qualified metric name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.desc.fq_name
    }

    /// Looks up a label value by label name
    #[must_use]
    pub fn label(&self, name: &str) -> Option<&str> {
        self.desc
            .label_names
            .iter()
            .position(|n| *n == name)
            .and_then(|i| self.label_values.get(i))
            .map(String::as_str)
    }
}

/// Write side of the per-scrape sample channel
///
/// Cloned into every decode task; the read side ends once all clones are
/// dropped.
#[derive(Debug, Clone)]
pub struct SampleSink {
    tx: mpsc::UnboundedSender<MetricSample>,
}

/// Read side of the per-scrape sample channel
pub type SampleReceiver = mpsc::UnboundedReceiver<MetricSample>;

impl SampleSink {
    /// Creates a connected sink/receiver pair
    #[must_use]
    pub fn channel() -> (Self, SampleReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emits one gauge sample.
    ///
    /// # Errors
    ///
    /// Returns [`DecoderError::SinkClosed`] if the receiver was dropped.
    pub fn gauge(
        &self,
        desc: &Arc<MetricDesc>,
        value: f64,
        label_values: &[&str],
    ) -> DecoderResult<()> {
        let sample = MetricSample {
            desc: Arc::clone(desc),
            label_values: label_values.iter().map(|v| (*v).to_string()).collect(),
            value,
        };
        self.tx
            .send(sample)
            .map_err(|_| DecoderError::SinkClosed(desc.fq_name.clone()))
    }
}

/// Drains every sample still buffered in `rx`
///
/// Call after the orchestrator returned; samples sent later are not seen.
#[must_use]
pub fn drain_samples(rx: &mut SampleReceiver) -> Vec<MetricSample> {
    let mut samples = Vec::new();
    while let Ok(sample) = rx.try_recv() {
        samples.push(sample);
    }
    samples
}

/// Decodes the lines of one agent section
///
/// Implementations must be stateless: `update` takes `&self`, may run on
/// several threads at once and must not keep anything between calls.
pub trait SubsystemDecoder: Send + Sync {
    /// Section name this decoder reads, e.g. `"df"`
    fn subsystem(&self) -> &'static str;

    /// Parses `lines` and writes the resulting samples into `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`DecoderError::SinkClosed`] if the sink went away. Malformed
    /// input is never an error.
    fn update(&self, lines: &[String], sink: &SampleSink) -> DecoderResult<()>;
}

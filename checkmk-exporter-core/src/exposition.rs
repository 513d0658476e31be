//! Prometheus text exposition of one scrape
//!
//! Every request gets its own [`Registry`]: one `GaugeVec` per metric name
//! seen in the samples plus the scrape-status gauges from the report.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use prometheus::{Gauge, GaugeVec, Opts, Registry, TextEncoder};

use crate::decoder::{MetricSample, NAMESPACE, build_fq_name};
use crate::scrape::ScrapeReport;

/// Content type of the text exposition format
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Encodes samples and scrape status as Prometheus text.
///
/// A label set that appears twice for the same metric keeps the last value.
///
/// # Errors
///
/// Returns a [`prometheus::Error`] if a sample does not match its
/// descriptor's label names or encoding fails.
pub fn render(
    samples: &[MetricSample],
    report: &ScrapeReport,
) -> Result<String, prometheus::Error> {
    let registry = Registry::new();

    let mut gauges: BTreeMap<&str, GaugeVec> = BTreeMap::new();
    for sample in samples {
        let vec = match gauges.entry(sample.name()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let vec = GaugeVec::new(
                    Opts::new(sample.desc.fq_name.as_str(), sample.desc.help.as_str()),
                    sample.desc.label_names,
                )?;
                registry.register(Box::new(vec.clone()))?;
                entry.insert(vec)
            }
        };
        let labels: Vec<&str> = sample.label_values.iter().map(String::as_str).collect();
        vec.get_metric_with_label_values(&labels)?.set(sample.value);
    }

    register_status(&registry, report)?;

    let mut buffer = String::new();
    TextEncoder::new().encode_utf8(&registry.gather(), &mut buffer)?;
    Ok(buffer)
}

fn status_name(name: &str) -> String {
    build_fq_name(NAMESPACE, "scrape", name)
}

fn register_status(registry: &Registry, report: &ScrapeReport) -> Result<(), prometheus::Error> {
    let success = Gauge::new(
        status_name("success"),
        "Whether the agent output could be fetched from the target",
    )?;
    success.set(if report.is_success() { 1.0 } else { 0.0 });
    registry.register(Box::new(success))?;

    let duration = Gauge::new(
        status_name("duration_seconds"),
        "Time taken by the scrape in seconds",
    )?;
    duration.set(report.duration.as_secs_f64());
    registry.register(Box::new(duration))?;

    let timestamp = Gauge::new(
        status_name("timestamp_seconds"),
        "Unix time the scrape started",
    )?;
    timestamp.set(report.started_at.timestamp_millis() as f64 / 1000.0);
    registry.register(Box::new(timestamp))?;

    if let Some(failure) = &report.failure {
        let error = GaugeVec::new(
            Opts::new(status_name("error"), "Stage and message of a failed scrape"),
            &["stage", "error"],
        )?;
        error
            .get_metric_with_label_values(&[failure.stage, failure.message.as_str()])?
            .set(1.0);
        registry.register(Box::new(error))?;
    }

    if !report.collectors.is_empty() {
        let collectors = GaugeVec::new(
            Opts::new(
                status_name("collector_success"),
                "Whether a subsystem decoder finished without error",
            ),
            &["collector"],
        )?;
        for outcome in &report.collectors {
            collectors
                .get_metric_with_label_values(&[outcome.subsystem.as_str()])?
                .set(if outcome.is_success() { 1.0 } else { 0.0 });
        }
        registry.register(Box::new(collectors))?;
    }

    Ok(())
}

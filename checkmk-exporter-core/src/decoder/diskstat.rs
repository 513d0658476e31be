//! Block device I/O counters from the `diskstat` section
//!
//! The first line of the section is a timestamp header. Every other line
//! follows `/proc/diskstats`: major, minor, device name, then eleven I/O
//! counters and, on 4.18+ kernels, four discard counters.

use std::sync::Arc;

use super::{MetricDesc, SampleSink, SubsystemDecoder, parse_value};
use crate::error::DecoderResult;

/// Section name
pub const SUBSYSTEM: &str = "diskstat";

const LABEL_NAMES: &[&str] = &["major_number", "minor_number", "device_name"];

/// Labels plus the eleven base counters
const MIN_FIELDS: usize = 14;

/// Metric name and help text, in counter order
const COUNTERS: [(&str, &str); 15] = [
    ("reads_completed_successfully", "reads completed successfully"),
    ("reads_merged", "reads merged"),
    ("sectors_read", "sectors read"),
    ("time_spent_reading", "time spent reading (ms)"),
    ("writes_completed_successfully", "Writes completed successfully"),
    ("writes_merged", "writes merged"),
    ("sectors_written", "sectors written"),
    ("time_spent_writing", "time spent writing (ms)"),
    ("io_currently_in_progress", "I/Os currently in progress"),
    ("time_spent_doing_io", "time spent doing I/Os (ms)"),
    ("weighted_time_spent_doing_io", "weighted time spent doing I/Os (ms)"),
    ("discards_completed_successfully", "discards completed successfully"),
    ("discards_merged", "discards merged"),
    ("sectors_discarded", "sectors discarded"),
    ("time_spent_discarding", "time spent discarding"),
];

/// One parsed device line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiskStats {
    /// Device major number
    pub major: String,
    /// Device minor number
    pub minor: String,
    /// Device name, e.g. `sda`
    pub device: String,
    /// Reads completed successfully
    pub reads_completed: f64,
    /// Reads merged
    pub reads_merged: f64,
    /// Sectors read
    pub sectors_read: f64,
    /// Time spent reading (ms)
    pub time_reading: f64,
    /// Writes completed successfully
    pub writes_completed: f64,
    /// Writes merged
    pub writes_merged: f64,
    /// Sectors written
    pub sectors_written: f64,
    /// Time spent writing (ms)
    pub time_writing: f64,
    /// I/Os currently in progress
    pub io_in_progress: f64,
    /// Time spent doing I/Os (ms)
    pub time_io: f64,
    /// Weighted time spent doing I/Os (ms)
    pub weighted_time_io: f64,
    /// Discards completed successfully
    pub discards_completed: f64,
    /// Discards merged
    pub discards_merged: f64,
    /// Sectors discarded
    pub sectors_discarded: f64,
    /// Time spent discarding (ms)
    pub time_discarding: f64,
}

impl DiskStats {
    /// Parses one device line, `None` if it has fewer than fourteen fields.
    ///
    /// Discard counters missing from a short extended line stay `0.0`.
    #[must_use]
    pub fn parse_line(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < MIN_FIELDS {
            tracing::debug!(line, "Skipping short diskstat line");
            return None;
        }

        let p = |i: usize| -> f64 { parts.get(i).map_or(0.0, |f| parse_value(f)) };

        Some(Self {
            major: parts[0].to_string(),
            minor: parts[1].to_string(),
            device: parts[2].to_string(),
            reads_completed: p(3),
            reads_merged: p(4),
            sectors_read: p(5),
            time_reading: p(6),
            writes_completed: p(7),
            writes_merged: p(8),
            sectors_written: p(9),
            time_writing: p(10),
            io_in_progress: p(11),
            time_io: p(12),
            weighted_time_io: p(13),
            discards_completed: p(14),
            discards_merged: p(15),
            sectors_discarded: p(16),
            time_discarding: p(17),
        })
    }

    /// Counter values in [`COUNTERS`] order
    #[must_use]
    pub fn values(&self) -> [f64; 15] {
        [
            self.reads_completed,
            self.reads_merged,
            self.sectors_read,
            self.time_reading,
            self.writes_completed,
            self.writes_merged,
            self.sectors_written,
            self.time_writing,
            self.io_in_progress,
            self.time_io,
            self.weighted_time_io,
            self.discards_completed,
            self.discards_merged,
            self.sectors_discarded,
            self.time_discarding,
        ]
    }
}

/// Decoder for the `diskstat` section
#[derive(Debug)]
pub struct BlockDeviceIo {
    descs: Vec<Arc<MetricDesc>>,
}

impl Default for BlockDeviceIo {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDeviceIo {
    /// Creates the decoder with its fifteen descriptors
    #[must_use]
    pub fn new() -> Self {
        Self {
            descs: COUNTERS
                .iter()
                .map(|(name, help)| MetricDesc::new(SUBSYSTEM, name, *help, LABEL_NAMES))
                .collect(),
        }
    }

    /// Factory for the [`DecoderRegistry`](super::DecoderRegistry).
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches other factories.
    pub fn factory() -> DecoderResult<Box<dyn SubsystemDecoder>> {
        Ok(Box::new(Self::new()))
    }

    /// Parses every device line, skipping the header
    #[must_use]
    pub fn parse_stats(lines: &[String]) -> Vec<DiskStats> {
        lines
            .iter()
            .skip(1)
            .filter_map(|line| DiskStats::parse_line(line))
            .collect()
    }
}

impl SubsystemDecoder for BlockDeviceIo {
    fn subsystem(&self) -> &'static str {
        SUBSYSTEM
    }

    fn update(&self, lines: &[String], sink: &SampleSink) -> DecoderResult<()> {
        for disk in Self::parse_stats(lines) {
            let labels = [disk.major.as_str(), disk.minor.as_str(), disk.device.as_str()];
            for (desc, value) in self.descs.iter().zip(disk.values()) {
                sink.gauge(desc, value, &labels)?;
            }
        }
        Ok(())
    }
}

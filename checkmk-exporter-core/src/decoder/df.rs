//! Filesystem usage from the `df` section
//!
//! Line format: `device fstype size used avail percentage% mountpoint`

use std::sync::Arc;

use super::{MetricDesc, SampleSink, SubsystemDecoder, parse_value};
use crate::error::DecoderResult;

/// Section name
pub const SUBSYSTEM: &str = "df";

const LABEL_NAMES: &[&str] = &["device", "mountpoint", "fstype"];

/// Fields needed for one filesystem line
const MIN_FIELDS: usize = 7;

/// One parsed filesystem line
#[derive(Debug, Clone, PartialEq)]
pub struct FilesystemStats {
    /// Block device or pseudo filesystem source
    pub device: String,
    /// Mount point
    pub mount_point: String,
    /// Filesystem type
    pub fs_type: String,
    /// Total size
    pub size: f64,
    /// Used size
    pub used: f64,
    /// Available size
    pub avail: f64,
    /// Used percentage
    pub percentage: f64,
}

impl FilesystemStats {
    /// Parses one line, `None` if it has fewer than seven fields
    #[must_use]
    pub fn parse_line(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < MIN_FIELDS {
            tracing::debug!(line, "Skipping short df line");
            return None;
        }

        Some(Self {
            device: parts[0].to_string(),
            fs_type: parts[1].to_string(),
            size: parse_value(parts[2]),
            used: parse_value(parts[3]),
            avail: parse_value(parts[4]),
            percentage: parse_value(parts[5].trim_matches('%')),
            mount_point: parts[6].to_string(),
        })
    }
}

/// Decoder for the `df` section
#[derive(Debug)]
pub struct FilesystemUsage {
    size: Arc<MetricDesc>,
    used: Arc<MetricDesc>,
    avail: Arc<MetricDesc>,
    percentage: Arc<MetricDesc>,
}

impl Default for FilesystemUsage {
    fn default() -> Self {
        Self::new()
    }
}

impl FilesystemUsage {
    /// Creates the decoder with its four descriptors
    #[must_use]
    pub fn new() -> Self {
        Self {
            size: MetricDesc::new(SUBSYSTEM, "fs_total_size", "Filesystem total size", LABEL_NAMES),
            used: MetricDesc::new(SUBSYSTEM, "fs_used_size", "Filesystem used size", LABEL_NAMES),
            avail: MetricDesc::new(
                SUBSYSTEM,
                "fs_available_size",
                "Filesystem available size",
                LABEL_NAMES,
            ),
            percentage: MetricDesc::new(
                SUBSYSTEM,
                "fs_percentage_used",
                "Filesystem used percentage",
                LABEL_NAMES,
            ),
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

    /// Parses every usable line of the section
    #[must_use]
    pub fn parse_stats(lines: &[String]) -> Vec<FilesystemStats> {
        lines
            .iter()
            .filter_map(|line| FilesystemStats::parse_line(line))
            .collect()
    }
}

impl SubsystemDecoder for FilesystemUsage {
    fn subsystem(&self) -> &'static str {
        SUBSYSTEM
    }

    fn update(&self, lines: &[String], sink: &SampleSink) -> DecoderResult<()> {
        for fs in Self::parse_stats(lines) {
            let labels = [
                fs.device.as_str(),
                fs.mount_point.as_str(),
                fs.fs_type.as_str(),
            ];
            sink.gauge(&self.size, fs.size, &labels)?;
            sink.gauge(&self.used, fs.used, &labels)?;
            sink.gauge(&self.avail, fs.avail, &labels)?;
            sink.gauge(&self.percentage, fs.percentage, &labels)?;
        }
        Ok(())
    }
}

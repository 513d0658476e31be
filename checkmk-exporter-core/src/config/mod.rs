//! Configuration for the exporter
//!
//! Targets are read once at startup from a YAML file with a root `targets`
//! map. An optional root `ssh` map tunes the connection provider.
//!
//! ```yaml
//! targets:
//!   web01:
//!     HostName: web01.example.com
//!     User: monitoring
//!     IdentityFile: ~/.ssh/monitoring_rsa
//! ssh:
//!   host_key_verification: accept-new
//! ```

mod settings;
mod target;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult, ScrapeError};

pub use settings::{DEFAULT_COMMAND, DEFAULT_SSH_BINARY, HostKeyVerification, SshSettings};
pub use target::{DEFAULT_IDENTITY_FILE, DEFAULT_PORT, Target, TargetOverrides};

/// Default location of the targets file
pub const DEFAULT_CONFIG_FILE: &str = "/etc/check_mk_exporter/ssh.yaml";

/// Contents of the targets file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Scrape targets by name
    #[serde(default)]
    pub targets: BTreeMap<String, Target>,
    /// Connection provider settings
    #[serde(default)]
    pub ssh: SshSettings,
}

impl ExporterConfig {
    /// Reads and parses the targets file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid YAML for this layout.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&source, path)?;
        tracing::debug!(
            path = %path.display(),
            targets = config.targets.len(),
            "Loaded targets"
        );
        Ok(config)
    }

    /// Parses targets from YAML text; `origin` is only used in error messages.
    ///
    /// Targets without a `HostName` use their own name as host.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed YAML and
    /// [`ConfigError::InvalidTarget`] for a target ssh could not reach.
    pub fn from_yaml_str(source: &str, origin: &Path) -> ConfigResult<Self> {
        // An empty file deserializes to unit, not to an empty mapping
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: Self = serde_yaml::from_str(source).map_err(|e| ConfigError::Parse {
            path: PathBuf::from(origin),
            reason: e.to_string(),
        })?;
        for (name, target) in &mut config.targets {
            if target.host_name.trim().is_empty() {
                target.host_name.clone_from(name);
            }
            validate_target(name, target)?;
        }
        Ok(config)
    }

    /// Looks up a target by name and applies request overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::MissingTarget`] when `name` is absent or empty
    /// and [`ScrapeError::UnknownTarget`] when it is not configured.
    pub fn resolve_target(
        &self,
        name: Option<&str>,
        overrides: &TargetOverrides,
    ) -> Result<Target, ScrapeError> {
        let name = name
            .filter(|n| !n.is_empty())
            .ok_or(ScrapeError::MissingTarget)?;
        let target = self
            .targets
            .get(name)
            .ok_or_else(|| ScrapeError::UnknownTarget(name.to_string()))?;
        Ok(overrides.apply(target))
    }
}

fn validate_target(name: &str, target: &Target) -> ConfigResult<()> {
    let invalid = |reason: &str| ConfigError::InvalidTarget {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if target.port == 0 {
        return Err(invalid("port must be between 1 and 65535"));
    }
    if target.host_name.chars().any(char::is_whitespace) {
        return Err(invalid("host name must not contain whitespace"));
    }
    if target.host_name.starts_with('-') {
        return Err(invalid("host name must not start with '-'"));
    }
    Ok(())
}

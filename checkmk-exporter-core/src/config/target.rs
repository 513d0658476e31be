//! Scrape targets and per-request overrides

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default SSH port
pub const DEFAULT_PORT: u16 = 22;

/// Default private key used when a target does not name one
pub const DEFAULT_IDENTITY_FILE: &str = "~/.ssh/id_rsa";

const fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_identity_file() -> String {
    DEFAULT_IDENTITY_FILE.to_string()
}

/// A remote host reachable over SSH
///
/// Field names follow the targets file (`HostName`, `Port`, `User`,
/// `IdentityFile`); lower-case aliases are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Target {
    /// Hostname or IP address. Empty means "use the target's name".
    #[serde(default, alias = "host")]
    pub host_name: String,
    /// SSH port
    #[serde(default = "default_port", alias = "port")]
    pub port: u16,
    /// Remote user; the ssh client's default user when absent
    #[serde(default, alias = "user", skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Path to the private key, `~` is expanded at connect time
    #[serde(default = "default_identity_file", alias = "identity_file")]
    pub identity_file: String,
}

impl Target {
    /// Creates a target with default port and key
    #[must_use]
    pub fn new(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            port: DEFAULT_PORT,
            user: None,
            identity_file: default_identity_file(),
        }
    }

    /// Sets the remote user
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Sets the SSH port
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the private key path
    #[must_use]
    pub fn with_identity_file(mut self, path: impl Into<String>) -> Self {
        self.identity_file = path.into();
        self
    }

    /// Returns the key path with a leading `~` expanded
    #[must_use]
    pub fn identity_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.identity_file).into_owned())
    }

    /// Returns `host:port` for logging
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host_name, self.port)
    }
}

/// Connection details supplied with a single scrape request
///
/// Empty strings are treated as "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetOverrides {
    /// Port override
    pub port: Option<u16>,
    /// User override
    pub user: Option<String>,
    /// Private key override
    pub identity_file: Option<String>,
}

impl TargetOverrides {
    /// Builds overrides from raw request parameters.
    ///
    /// A port that does not parse is ignored, the configured port stays.
    #[must_use]
    pub fn from_params(
        port: Option<&str>,
        user: Option<&str>,
        identity_file: Option<&str>,
    ) -> Self {
        let port = port.filter(|p| !p.is_empty()).and_then(|p| {
            p.parse::<u16>()
                .inspect_err(|e| tracing::debug!(port = p, error = %e, "Ignoring port override"))
                .ok()
        });
        Self {
            port,
            user: user.filter(|u| !u.is_empty()).map(str::to_string),
            identity_file: identity_file
                .filter(|f| !f.is_empty())
                .map(str::to_string),
        }
    }

    /// Returns a request-scoped copy of `target` with the overrides applied
    #[must_use]
    pub fn apply(&self, target: &Target) -> Target {
        let mut scoped = target.clone();
        if let Some(port) = self.port {
            scoped.port = port;
        }
        if let Some(ref user) = self.user {
            scoped.user = Some(user.clone());
        }
        if let Some(ref identity_file) = self.identity_file {
            scoped.identity_file.clone_from(identity_file);
        }
        scoped
    }

    /// Returns true when no override was supplied
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.port.is_none() && self.user.is_none() && self.identity_file.is_none()
    }
}

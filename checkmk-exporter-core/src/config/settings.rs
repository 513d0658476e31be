//! SSH provider settings (stored in the targets file under `ssh:`)

use serde::{Deserialize, Serialize};

use crate::connection::RetryConfig;

/// Remote command run when the config does not name one
pub const DEFAULT_COMMAND: &str = "check_mk_agent";

/// Local ssh client binary
pub const DEFAULT_SSH_BINARY: &str = "ssh";

fn default_command() -> String {
    DEFAULT_COMMAND.to_string()
}

fn default_ssh_binary() -> String {
    DEFAULT_SSH_BINARY.to_string()
}

/// How the remote host key is checked
///
/// `Strict` relies on an existing `known_hosts` entry. `Disabled` skips
/// verification entirely and must be chosen explicitly; it trusts whatever
/// host answers on the target address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyVerification {
    /// Reject unknown and changed host keys
    #[default]
    Strict,
    /// Record unknown host keys on first use, reject changed ones
    AcceptNew,
    /// Do not verify host keys at all
    Disabled,
}

impl HostKeyVerification {
    /// Returns the `-o` options passed to the ssh client
    #[must_use]
    pub fn ssh_options(self, known_hosts_file: Option<&str>) -> Vec<String> {
        let mut options = match self {
            Self::Strict => vec!["StrictHostKeyChecking=yes".to_string()],
            Self::AcceptNew => vec!["StrictHostKeyChecking=accept-new".to_string()],
            Self::Disabled => vec![
                "StrictHostKeyChecking=no".to_string(),
                "UserKnownHostsFile=/dev/null".to_string(),
                "LogLevel=ERROR".to_string(),
            ],
        };
        if self != Self::Disabled
            && let Some(path) = known_hosts_file
        {
            options.push(format!(
                "UserKnownHostsFile={}",
                shellexpand::tilde(path).into_owned()
            ));
        }
        options
    }
}

impl std::fmt::Display for HostKeyVerification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::AcceptNew => write!(f, "accept-new"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

/// Settings for the SSH connection provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshSettings {
    /// Remote command whose stdout is scraped
    #[serde(default = "default_command")]
    pub command: String,
    /// Host key policy
    #[serde(default)]
    pub host_key_verification: HostKeyVerification,
    /// Alternative `known_hosts` file (ignored when verification is disabled)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_hosts_file: Option<String>,
    /// TCP connect timeout handed to the ssh client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u32>,
    /// Upper bound for the whole remote command; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,
    /// ssh client binary
    #[serde(default = "default_ssh_binary")]
    pub ssh_binary: String,
    /// Dial retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            command: default_command(),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_file: None,
            connect_timeout_secs: None,
            command_timeout_secs: None,
            ssh_binary: default_ssh_binary(),
            retry: RetryConfig::default(),
        }
    }
}

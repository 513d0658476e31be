//! Integration tests for loading the targets file

use std::io::Write;

use checkmk_exporter_core::config::DEFAULT_COMMAND;
use checkmk_exporter_core::{
    ConfigError, ExporterConfig, HostKeyVerification, ScrapeError, TargetOverrides,
};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn test_load_targets_and_ssh_settings() {
    let file = write_config(
        "\
targets:
  web01:
    HostName: web01.example.com
    User: monitoring
    IdentityFile: /etc/check_mk_exporter/id_ed25519
  db01:
    HostName: 10.0.0.5
    Port: 2222
ssh:
  host_key_verification: accept-new
  known_hosts_file: /var/lib/check_mk_exporter/known_hosts
  connect_timeout_secs: 5
  command_timeout_secs: 30
  retry:
    enabled: true
    max_attempts: 3
",
    );

    let config = ExporterConfig::load(file.path()).unwrap();
    assert_eq!(config.targets.len(), 2);
    assert_eq!(config.targets["db01"].port, 2222);
    assert_eq!(
        config.targets["web01"].identity_file,
        "/etc/check_mk_exporter/id_ed25519"
    );

    assert_eq!(config.ssh.host_key_verification, HostKeyVerification::AcceptNew);
    assert_eq!(config.ssh.command, DEFAULT_COMMAND);
    assert_eq!(config.ssh.connect_timeout_secs, Some(5));
    assert_eq!(config.ssh.command_timeout_secs, Some(30));
    assert!(config.ssh.retry.enabled);
    assert_eq!(config.ssh.retry.max_attempts, 3);
}

#[test]
fn test_missing_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ExporterConfig::load(&dir.path().join("ssh.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().starts_with("Unable to open"));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let file = write_config("targets:\n  web01: [unterminated\n");
    let err = ExporterConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_resolve_with_request_overrides() {
    let file = write_config("targets:\n  web01:\n    HostName: web01.example.com\n");
    let config = ExporterConfig::load(file.path()).unwrap();

    let overrides = TargetOverrides::from_params(Some("2200"), Some("nagios"), Some("/tmp/key"));
    let target = config.resolve_target(Some("web01"), &overrides).unwrap();
    assert_eq!(target.host_name, "web01.example.com");
    assert_eq!(target.port, 2200);
    assert_eq!(target.user.as_deref(), Some("nagios"));
    assert_eq!(target.identity_file, "/tmp/key");

    let bad_port = TargetOverrides::from_params(Some("ssh"), None, None);
    assert_eq!(config.resolve_target(Some("web01"), &bad_port).unwrap().port, 22);

    let err = config
        .resolve_target(Some("db99"), &TargetOverrides::default())
        .unwrap_err();
    assert_eq!(err, ScrapeError::UnknownTarget("db99".into()));
    assert_eq!(err.to_string(), "Unknown target 'db99'");
}

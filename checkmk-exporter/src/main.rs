//! check_mk exporter - Prometheus exporter for check_mk agents over SSH
//!
//! Loads the targets file once, then serves `/check_mk?target=<name>`:
//! every request runs the agent on the target over SSH and returns the
//! decoded sections as Prometheus gauges.

mod cli;
mod error;
mod server;

use std::sync::Arc;

use checkmk_exporter_core::{
    DecoderRegistry, ExporterConfig, HostKeyVerification, LoggingConfig, ScrapeOrchestrator,
    SshConnectionProvider, init_logging,
};
use clap::Parser;

use cli::Cli;
use error::CliError;
use server::{AppState, ExporterMetrics};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    init_logging(&LoggingConfig::new().with_level(cli.log_level))?;

    let mut config = ExporterConfig::load(&cli.config_file)?;
    if cli.insecure_ignore_host_key {
        tracing::warn!("Host key verification disabled for all targets");
        config.ssh.host_key_verification = HostKeyVerification::Disabled;
    }
    tracing::info!(
        path = %cli.config_file.display(),
        targets = config.targets.len(),
        host_key_verification = %config.ssh.host_key_verification,
        "Configuration loaded"
    );

    let registry = DecoderRegistry::builtin();
    tracing::debug!(subsystems = ?registry.subsystems().collect::<Vec<_>>(), "Decoders registered");
    let provider = SshConnectionProvider::new(config.ssh.clone());
    let scraper = ScrapeOrchestrator::new(Arc::new(provider), Arc::new(registry));
    let state = AppState::new(config, scraper, ExporterMetrics::new()?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Server(format!("unable to start runtime: {e}")))?;
    runtime.block_on(server::serve(cli.listen_addr(), state))
}

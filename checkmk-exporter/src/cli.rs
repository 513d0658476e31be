//! CLI argument parsing types using `clap`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use checkmk_exporter_core::LogLevel;
use checkmk_exporter_core::config::DEFAULT_CONFIG_FILE;
use clap::Parser;

/// Default HTTP port
pub const DEFAULT_LISTEN_PORT: u16 = 2112;

/// Prometheus exporter that scrapes check_mk agents over SSH
#[derive(Debug, Parser)]
#[command(name = "checkmk-exporter")]
#[command(version, about = "Prometheus exporter for check_mk agents reached over SSH")]
pub struct Cli {
    /// Targets file to use
    #[arg(
        long = "config.file",
        value_name = "PATH",
        default_value = DEFAULT_CONFIG_FILE,
        env = "CHECK_MK_EXPORTER_CONFIG"
    )]
    pub config_file: PathBuf,

    /// Port to listen on
    #[arg(
        long = "listen.port",
        value_name = "PORT",
        default_value_t = DEFAULT_LISTEN_PORT,
        env = "CHECK_MK_EXPORTER_PORT"
    )]
    pub listen_port: u16,

    /// Address to listen on
    #[arg(
        long = "listen.address",
        value_name = "ADDR",
        default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        env = "CHECK_MK_EXPORTER_ADDRESS"
    )]
    pub listen_address: IpAddr,

    /// Log level (error, warn, info, debug, trace)
    #[arg(
        short = 'l',
        long = "log.level",
        value_name = "LEVEL",
        default_value = "info",
        env = "CHECK_MK_EXPORTER_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// Skip host key verification for every target (insecure)
    #[arg(
        long = "ssh.insecure-ignore-host-key",
        env = "CHECK_MK_EXPORTER_INSECURE_IGNORE_HOST_KEY"
    )]
    pub insecure_ignore_host_key: bool,
}

impl Cli {
    /// Socket address the HTTP server binds to
    #[must_use]
    pub const fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.listen_port)
    }
}

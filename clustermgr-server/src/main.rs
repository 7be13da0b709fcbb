//! clustermgr management server

use anyhow::Context;
use clap::{value_parser, Arg, Command};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use clustermgr_engine::{NodeProfile, RegistryEngine};
use clustermgr_server::{ManagementServer, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = Command::new("clustermgr-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Bucket management endpoint for a data-store cluster")
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("PATH")
                .help("Registry data directory path")
                .value_parser(value_parser!(PathBuf))
                .default_value("./data")
        )
        .arg(
            Arg::new("bind")
                .long("bind")
                .value_name("ADDR")
                .help("Bind address")
                .value_parser(value_parser!(SocketAddr))
                .default_value("127.0.0.1:8091")
        )
        .arg(
            Arg::new("hostname")
                .long("hostname")
                .value_name("HOST")
                .help("Hostname this node reports in cluster info (defaults to the bind address)")
        )
        .arg(
            Arg::new("server-version")
                .long("server-version")
                .value_name("VERSION")
                .help("Version string this node reports")
                .default_value("7.2.0-0000-community")
        )
        .arg(
            Arg::new("ram-total-mb")
                .long("ram-total-mb")
                .value_name("MB")
                .help("RAM available for bucket quotas")
                .value_parser(value_parser!(u64))
                .default_value("4096")
        )
        .arg(
            Arg::new("disk-total-mb")
                .long("disk-total-mb")
                .value_name("MB")
                .help("Disk capacity reported in cluster info")
                .value_parser(value_parser!(u64))
                .default_value("65536")
        )
        .get_matches();

    let data_dir = matches
        .get_one::<PathBuf>("data-dir")
        .cloned()
        .context("missing --data-dir")?;
    let bind_addr = *matches
        .get_one::<SocketAddr>("bind")
        .context("missing --bind")?;

    let profile = NodeProfile {
        hostname: matches
            .get_one::<String>("hostname")
            .cloned()
            .unwrap_or_else(|| bind_addr.to_string()),
        version: matches
            .get_one::<String>("server-version")
            .cloned()
            .context("missing --server-version")?,
        ram_total_mb: *matches.get_one::<u64>("ram-total-mb").context("missing --ram-total-mb")?,
        disk_total_mb: *matches.get_one::<u64>("disk-total-mb").context("missing --disk-total-mb")?,
        ..NodeProfile::default()
    };

    info!("Starting clustermgr server");
    info!("Data directory: {}", data_dir.display());
    info!("Bind address: {}", bind_addr);

    // Create data directory if it doesn't exist
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
        info!("Created data directory: {}", data_dir.display());
    }

    let engine = RegistryEngine::new(&data_dir).context("failed to open bucket registry")?;
    let state = ServerState::new(engine, profile).context("failed to open bucket registry")?;

    info!("Bucket registry initialized");

    let server = ManagementServer::new(state);

    if let Err(e) = server.serve_addr(bind_addr).await {
        warn!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

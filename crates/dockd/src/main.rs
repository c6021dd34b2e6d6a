//! dockd — the dockgrid daemon.
//!
//! Loads `dockgrid.toml`, builds the configured controller backend,
//! registers every service profile, and keeps each service at its
//! configured instance count.
//!
//! # Usage
//!
//! ```text
//! dockd run --config /etc/dockgrid/dockgrid.toml --interval 30
//! dockd status --config /etc/dockgrid/dockgrid.toml --format json
//! ```

mod reconciler;
mod status;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use dockgrid_core::DockgridConfig;

use crate::reconciler::Reconciler;

#[derive(Parser)]
#[command(name = "dockd", about = "dockgrid daemon", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile every configured service on an interval until Ctrl-C.
    Run {
        /// Path to dockgrid.toml.
        #[arg(short, long, default_value = "/etc/dockgrid/dockgrid.toml")]
        config: PathBuf,

        /// Reconciliation interval in seconds.
        #[arg(long, default_value = "30")]
        interval: u64,
    },
    /// Print live counts and free capacity once.
    Status {
        /// Path to dockgrid.toml.
        #[arg(short, long, default_value = "/etc/dockgrid/dockgrid.toml")]
        config: PathBuf,

        /// Output format: text or json.
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dockd=debug,dockgrid=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run { config, interval } => run(config, interval).await,
        Command::Status { config, format } => {
            let config = DockgridConfig::from_file(&config)?;
            let controller = dockgrid_controller::build_controller(&config.controller).await?;
            let report = status::collect(controller.as_ref(), &config.services).await?;
            status::print(&report, &format)
        }
    }
}

async fn run(config_path: PathBuf, interval: u64) -> anyhow::Result<()> {
    let config = DockgridConfig::from_file(&config_path)?;
    info!(path = ?config_path, services = config.services.len(), "configuration loaded");

    let controller: Arc<dyn dockgrid_controller::ScalingController> =
        Arc::from(dockgrid_controller::build_controller(&config.controller).await?);

    let mut reconciler = Reconciler::new(controller, &config.services);
    if let Some(refresh) = config.host_refresh_interval() {
        reconciler = reconciler.with_host_refresh(refresh);
    }
    reconciler.register_profiles(&config.services).await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        reconciler
            .run(Duration::from_secs(interval), shutdown_rx)
            .await;
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    let _ = handle.await;

    info!("dockd stopped");
    Ok(())
}

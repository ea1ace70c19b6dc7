//! Pluggable HTTP gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                     GATEWAY                      │
//!   Client Request     │  ┌─────────┐    ┌──────────────┐                 │
//!   ───────────────────┼─▶│  http   │───▶│   routing    │──┬─▶ status     │
//!                      │  │ server  │    │   engine     │  ├─▶ files      │
//!                      │  └─────────┘    └──────┬───────┘  └─▶ router     │
//!   Client Response    │       ▲   404 / 405    │                         │
//!   ◀──────────────────┼───────┴────────────────┘                         │
//!                      │                                                  │
//!                      │  config ─▶ plugins ─▶ mount_gateway (startup)    │
//!                      │  observability · lifecycle                       │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use plugin_gateway::config::{load_config, GatewayConfig};
use plugin_gateway::lifecycle::{signals, startup, Shutdown};
use plugin_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "plugin-gateway")]
#[command(about = "Pluggable HTTP gateway", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(address) = args.address {
        config.listener.bind_address = address;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "plugin-gateway starting");
    tracing::info!(
        config = ?args.config,
        bind_address = %config.listener.bind_address,
        gateways = config.gateways.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    error = %e,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let app = startup::build(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        prefixes = ?app.router.prefixes(),
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    app.server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! Delayed digest service (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request        ┌──────────────────────────────────────────────┐
//!     ──────────────────────┼─▶ http server ──▶ routing ──▶ service         │
//!                           │   (axum, ids,     (route      handlers        │
//!                           │    tracing)        table)        │            │
//!                           │                                  ▼            │
//!     Client Response       │                             delayed store     │
//!     ◀─────────────────────┼── response ◀── stats         (reserve now,    │
//!                           │                               commit later)   │
//!                           │                                               │
//!                           │   config · lifecycle · observability          │
//!                           └──────────────────────────────────────────────┘
//! ```

use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use digest_server::config::{read_config, validate_config, ConfigError, ServiceConfig};
use digest_server::lifecycle::{signals, Shutdown};
use digest_server::observability::{logging, metrics};
use digest_server::HttpServer;

#[derive(Parser)]
#[command(name = "digest-server")]
#[command(about = "Accepts secrets and serves their delayed SHA-512 digests", long_about = None)]
struct Cli {
    /// Listen address, `host:port` or `:port`
    address: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (overrides the configuration file)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(address) = cli.address {
        config.listener.bind_address = address;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        commit_delay_ms = config.store.commit_delay_ms,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(config.listener.bind_target()).await?;
    tracing::info!(address = %listener.local_addr()?, "Launching HTTP server");

    let shutdown = Shutdown::new();
    signals::spawn_signal_watcher(shutdown.clone());

    let server = HttpServer::new(config, shutdown)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

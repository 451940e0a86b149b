//! API gateway server.
//!
//! # Architecture Overview
//!
//! ```text
//!  Client ──▶ http server ──▶ route table ──▶ security enforcer ──▶ validator
//!                                                                     │
//!                                                                     ▼
//!  Client ◀── http server ◀── response translator ◀── dispatcher ◀── mapper
//!                                                        │  ▲
//!                                                        ▼  │
//!                                                       Backend
//!
//!  Cross-cutting: config, document compiler, observability, lifecycle
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use api_gateway::http::HttpServer;
use api_gateway::lifecycle::{self, Shutdown};
use api_gateway::observability::{logging, metrics};

#[derive(Debug, Parser)]
#[command(name = "api-gateway", version, about = "Declarative API gateway")]
struct Args {
    /// Gateway configuration file (TOML).
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Read once up front so logging is configured before anything else runs.
    let config = api_gateway::config::load_config(&args.config)?;
    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-gateway starting");

    let loaded = lifecycle::load(&args.config)?;
    let engine = Arc::new(lifecycle::build_engine(&loaded.config, loaded.api.routes)?);

    if loaded.config.observability.metrics_enabled {
        match loaded.config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %loaded.config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&loaded.config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    lifecycle::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(&loaded.config, engine);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! spec-gate
//!
//! An HTTP gatekeeper that sits in front of an API implementation.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                    SPEC GATE                     │
//!                       │                                                  │
//!     Client Request    │  ┌─────────┐   ┌───────────┐   ┌─────────────┐  │
//!     ──────────────────┼─▶│  http   │──▶│  matcher  │──▶│ body/params │  │
//!                       │  │ server  │   │ (registry)│   │ validation  │  │
//!                       │  └─────────┘   └─────┬─────┘   └──────┬──────┘  │
//!                       │                 404  │        4xx/5xx │ allowed │
//!     Client Response   │  ┌─────────┐         │                ▼         │
//!     ◀─────────────────┼──│response │◀────────┴──────────┌───────────┐   │
//!                       │  │         │◀───────────────────│ forwarder │◀──┼──── Upstream API
//!                       │  └─────────┘                    └───────────┘   │
//!                       └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use spec_gate::config::loader::load_config;
use spec_gate::http::HttpServer;
use spec_gate::lifecycle::{signals, startup, Shutdown};
use spec_gate::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "spec-gate")]
#[command(about = "Validates requests against API specifications before they reach the API", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gate.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gate (default)
    Serve,
    /// Load the specs and list the registered path templates
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!(config = %cli.config.display(), "spec-gate v{} starting", env!("CARGO_PKG_VERSION"));

    let gate = startup::build_gate(&config)?;

    if let Some(Commands::Check) = cli.command {
        for path in gate.registry().iter() {
            println!("{}\t{}", path.base_path(), path.template());
        }
        return Ok(());
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        validation_failed_status = config.gate.validation_failed_status,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, gate)?;

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        signals::shutdown_on_signal(&shutdown).await;
    });

    server.run(listener, signal).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! Least-loaded backend router (standalone).
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────┐
//!   host proxy        │                 BACKEND ROUTER                │
//!   ──────────────────┼─▶ admin API ──▶ routing::Router               │
//!   session events,   │                   │        │                  │
//!   routing queries   │                   ▼        ▼                  │
//!                     │             tracker.rs   least_conn.rs        │
//!                     │                   │        ▲                  │
//!                     │                   ▼        │                  │
//!                     │              load_balancer::BackendRegistry   │
//!                     │                   ▲                           │
//!                     │                   │ generation-tagged writes  │
//!                     │              health::HealthProber ──────────────▶ backends
//!                     │                                               │   (TCP probe)
//!                     │  config (watcher, SIGHUP) ──▶ lifecycle::reload │
//!                     └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use backend_router::config::loader::load_or_init;
use backend_router::lifecycle::startup;
use backend_router::observability::logging;

#[derive(Parser)]
#[command(name = "backend-router")]
#[command(about = "Least-loaded routing for a set of named backends", long_about = None)]
struct Cli {
    /// Path to the config file. Created with defaults if missing.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let initial = load_or_init(&cli.config)?;
    logging::init_logging(&initial.config.observability);
    initial.log(&cli.config);
    let config = initial.config;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        servers = config.backend_ids().len(),
        interval_secs = config.health_check.interval_secs,
        timeout_secs = config.health_check.timeout_secs,
        "backend-router starting"
    );

    startup::run(&cli.config, config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

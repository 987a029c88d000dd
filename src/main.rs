//! sre-starter service binary.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ access log ─▶ metrics ─▶ exception ─▶ routes
//!                                      │            │        boundary      │
//!                                      ▼            ▼                      ├─ /health
//!                               JSON access   Prometheus                   ├─ /fail
//!                                 records      recorder ◀── GET /metrics   ├─ /metrics
//!                                                                          └─ /alertmanager
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use sre_starter::config::resolve_config;
use sre_starter::lifecycle;
use sre_starter::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "sre-starter")]
#[command(about = "HTTP service with access logs, metrics and an Alertmanager receiver", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match resolve_config(cli.config.as_deref(), |key| std::env::var(key).ok()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("sre-starter: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("sre-starter: failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        environment = %config.observability.environment,
        log_level = %config.observability.log_level,
        "sre-starter starting"
    );

    match lifecycle::serve(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Service failed");
            ExitCode::FAILURE
        }
    }
}

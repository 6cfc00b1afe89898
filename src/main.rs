//! Request governance gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ timeout ─▶ body limit
//!                                                          │
//!                                                          ▼
//!                                          ┌──────────────────────────────┐
//!                                          │  governance (guarded prefix) │
//!                                          │   CORS preflight / origin    │
//!                                          │   sliding window rate limit  │
//!                                          └──────────────┬───────────────┘
//!                                                         ▼
//!                                   /api/slack/incident (signature check)
//!                                   /api/incidents/{id}
//!                                   /health
//!
//!     Admin listener (optional): /admin/status, /admin/limiter/flush
//!     Metrics listener (optional): Prometheus scrape endpoint
//! ```

use std::path::PathBuf;

use clap::Parser;

use request_gateway::config::{load_config, load_from_env};
use request_gateway::lifecycle::startup;
use request_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "request-gateway")]
#[command(about = "Rate limiting, CORS and Slack signature gateway", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults plus environment when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    logging::init(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "request-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = %config.governance.environment,
        guarded_prefix = %config.governance.guarded_prefix,
        route_limits = config.rate_limit.routes.len(),
        admin_enabled = config.admin.enabled,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

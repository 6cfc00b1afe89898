//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order (metrics, governor, server)
//! - Bind the public and admin listeners
//! - Install signal handling and wait for shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use super::{signals, Shutdown};
use crate::admin::{setup_admin_router, AdminState};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::HttpServer;
use crate::observability::metrics;

pub fn parse_addr(address: &str) -> Result<SocketAddr, GatewayError> {
    address.parse().map_err(|source| GatewayError::Address {
        address: address.to_string(),
        source,
    })
}

/// Run the gateway until SIGINT/SIGTERM.
pub async fn run(config: GatewayConfig) -> Result<(), GatewayError> {
    let shutdown = Shutdown::new();

    if config.observability.metrics_enabled {
        metrics::init_metrics(parse_addr(&config.observability.metrics_address)?);
    }

    let server = HttpServer::new(config.clone())?;

    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(parse_addr(&config.admin.bind_address)?).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");

        let router = setup_admin_router(AdminState {
            governor: server.governor(),
            environment: config.governance.environment,
            api_key: Arc::from(config.admin.api_key.as_str()),
        });
        let mut rx = shutdown.subscribe();
        Some(tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = rx.recv().await;
                })
                .await
        }))
    } else {
        None
    };

    let listener = TcpListener::bind(parse_addr(&config.listener.bind_address)?).await?;
    let server_rx = shutdown.subscribe();
    tokio::spawn(signals::wait_for_signal(shutdown.clone()));

    server.run(listener, server_rx).await?;

    if let Some(task) = admin_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Admin API failed"),
            Err(e) => tracing::error!(error = %e, "Admin API task panicked"),
        }
    }

    Ok(())
}

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (governance, body limit, timeout, request ID, tracing)
//! - Bind server to listener and stop on the shutdown broadcast

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::middleware::governance_middleware;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::ApiError;
use crate::incident::{handler, InMemoryIncidentStore, IncidentService, IncidentStore};
use crate::security::{OriginPolicy, RequestGovernor, RouteLimits, SignatureVerifier, SlidingWindowLimiter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub incidents: Arc<IncidentService>,
    pub verifier: Arc<SignatureVerifier>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    governor: Arc<RequestGovernor>,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server with an in-memory incident store.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_store(config, Arc::new(InMemoryIncidentStore::new()))
    }

    pub fn with_store(
        config: GatewayConfig,
        store: Arc<dyn IncidentStore>,
    ) -> Result<Self, GatewayError> {
        let governor = Arc::new(build_governor(&config)?);

        let state = AppState {
            incidents: Arc::new(IncidentService::new(store)),
            verifier: Arc::new(SignatureVerifier::new(
                config.slack.signing_secret.clone(),
                config.slack.tolerance_secs,
            )),
        };
        if !state.verifier.has_secret() {
            tracing::warn!("No Slack signing secret configured; all slash commands will be rejected");
        }

        let router = Self::build_router(&config, state, governor.clone());
        Ok(Self {
            router,
            governor,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState, governor: Arc<RequestGovernor>) -> Router {
        Router::new()
            .route("/api/slack/incident", post(handler::slack_command))
            .route("/api/incidents/{id}", get(handler::get_incident))
            .route("/health", get(health))
            .fallback(not_found)
            .with_state(state)
            .layer(from_fn_with_state(governor, governance_middleware))
            .layer(DefaultBodyLimit::max(config.listener.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.listener.request_timeout_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// A clone of the fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The governor shared with the admin API.
    pub fn governor(&self) -> Arc<RequestGovernor> {
        self.governor.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve until the shutdown broadcast fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            guarded_prefix = %self.governor.guarded_prefix(),
            environment = %self.config.governance.environment,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Assemble the CORS policy and limiter described by `config`.
pub fn build_governor(config: &GatewayConfig) -> Result<RequestGovernor, GatewayError> {
    let environment = config.governance.environment;
    let origins = OriginPolicy::new(&config.cors, environment)?;
    let limits = RouteLimits::from_settings(&config.rate_limit)?;
    let limiter = Arc::new(SlidingWindowLimiter::new(limits));

    Ok(RequestGovernor::new(
        config.governance.guarded_prefix.clone(),
        origins,
        limiter,
    ))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> Response {
    ApiError::not_found("Not found").into_response()
}

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::AdminState;
use crate::config::Environment;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub environment: Environment,
    pub guarded_prefix: String,
    pub limiter_keys: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FlushResult {
    pub removed: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        environment: state.environment,
        guarded_prefix: state.governor.guarded_prefix().to_string(),
        limiter_keys: state.governor.limiter().len(),
    })
}

pub async fn flush_limiter(State(state): State<AdminState>) -> Json<FlushResult> {
    let removed = state.governor.limiter().flush();
    tracing::info!(removed, "Rate limiter flushed");
    Json(FlushResult { removed })
}

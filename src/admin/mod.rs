//! Admin API, served on its own listener.
//!
//! Every route requires `Authorization: Bearer {admin.api_key}`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::{flush_limiter, get_status};
use crate::config::Environment;
use crate::security::RequestGovernor;

#[derive(Clone)]
pub struct AdminState {
    pub governor: Arc<RequestGovernor>,
    pub environment: Environment,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/limiter/flush", post(flush_limiter))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

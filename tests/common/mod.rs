//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use request_gateway::config::{Environment, GatewayConfig, RouteLimitSettings};
use request_gateway::security::signature::{sign, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use request_gateway::HttpServer;

pub const SECRET: &str = "integration-signing-secret";
pub const DEV_ORIGIN: &str = "http://localhost:3000";
pub const PROD_ORIGIN: &str = "https://rooseveltops.com";

/// Development config with a signing secret and a tight `/api/` limit.
pub fn test_config(api_limit: u32) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.governance.environment = Environment::Development;
    config.slack.signing_secret = Some(SECRET.to_string());
    config.rate_limit.routes = vec![RouteLimitSettings {
        prefix: "/api/".to_string(),
        max_requests: api_limit,
        window_secs: 60,
    }];
    config
}

pub fn app(config: GatewayConfig) -> Router {
    HttpServer::new(config).expect("valid test config").router()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("router is infallible")
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

pub fn get(path: &str, client: &str) -> Request<Body> {
    Request::get(path)
        .header("x-forwarded-for", client)
        .body(Body::empty())
        .unwrap()
}

/// A signed `/incident` slash command.
pub fn slash_command(text: &str, client: &str) -> Request<Body> {
    let body = serde_urlencoded::to_string([
        ("command", "/incident"),
        ("text", text),
        ("user_id", "U123"),
        ("user_name", "alice"),
        ("channel_id", "C999"),
    ])
    .unwrap();
    let ts = now_secs().to_string();
    let signature = sign(SECRET, &ts, body.as_bytes());

    Request::post("/api/slack/incident")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("x-forwarded-for", client)
        .header(TIMESTAMP_HEADER, ts)
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body))
        .unwrap()
}

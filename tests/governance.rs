//! Governance behavior through the full router.

use std::io;
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};

use request_gateway::config::Environment;

mod common;
use common::{app, get, json_body, send, test_config, DEV_ORIGIN, PROD_ORIGIN};

fn with_origin(path: &str, client: &str, origin: &str) -> Request<Body> {
    Request::get(path)
        .header("x-forwarded-for", client)
        .header(header::ORIGIN, origin)
        .body(Body::empty())
        .unwrap()
}

fn preflight(path: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri(path)
        .header(header::ORIGIN, origin)
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap()
}

fn header_str<'a>(response: &'a axum::http::Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_admitted_requests_carry_rate_limit_headers() {
    let app = app(test_config(3));

    let response = send(&app, get("/api/incidents/nope", "10.0.0.1")).await;
    // Handler result is untouched; governance only decorates it.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(header_str(&response, "x-ratelimit-limit"), Some("3"));
    assert_eq!(header_str(&response, "x-ratelimit-remaining"), Some("2"));
    assert!(header_str(&response, "x-ratelimit-reset").is_some());
    assert!(header_str(&response, "retry-after").is_none());

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let response = send(&app, get("/api/incidents/nope", "10.0.0.1")).await;
    assert_eq!(header_str(&response, "x-ratelimit-remaining"), Some("1"));
}

#[tokio::test]
async fn test_limit_exceeded_returns_429() {
    let app = app(test_config(2));

    for _ in 0..2 {
        let response = send(&app, get("/api/incidents/x", "10.0.0.2")).await;
        assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    let response = send(&app, get("/api/incidents/x", "10.0.0.2")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header_str(&response, "x-ratelimit-limit"), Some("2"));
    assert_eq!(header_str(&response, "x-ratelimit-remaining"), Some("0"));

    let retry_after: u64 = header_str(&response, "retry-after").unwrap().parse().unwrap();
    assert!((1..=60).contains(&retry_after), "retry-after {retry_after}");

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");
    assert_eq!(body["error"]["message"], "Too many requests. Please try again later.");
    assert_eq!(body["error"]["retryAfter"].as_u64(), Some(retry_after));
}

#[tokio::test]
async fn test_rate_limited_response_keeps_cors_headers() {
    let app = app(test_config(1));

    send(&app, with_origin("/api/incidents/x", "10.0.0.3", DEV_ORIGIN)).await;
    let response = send(&app, with_origin("/api/incidents/x", "10.0.0.3", DEV_ORIGIN)).await;

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header_str(&response, "access-control-allow-origin"), Some(DEV_ORIGIN));
    assert_eq!(header_str(&response, "vary"), Some("Origin"));
}

#[tokio::test]
async fn test_disallowed_origin_rejected_without_consuming_quota() {
    let app = app(test_config(1));

    for _ in 0..3 {
        let response = send(&app, with_origin("/api/incidents/x", "10.0.0.4", "https://evil.example")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(header_str(&response, "x-ratelimit-limit").is_none());
        assert!(header_str(&response, "access-control-allow-origin").is_none());

        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "CORS_ERROR");
        assert_eq!(body["error"]["message"], "Origin not allowed");
    }

    let response = send(&app, get("/api/incidents/x", "10.0.0.4")).await;
    assert_eq!(header_str(&response, "x-ratelimit-remaining"), Some("0"));
    assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_preflight() {
    let app = app(test_config(1));

    for _ in 0..3 {
        let response = send(&app, preflight("/api/slack/incident", DEV_ORIGIN)).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(header_str(&response, "access-control-allow-origin"), Some(DEV_ORIGIN));
        assert_eq!(header_str(&response, "access-control-max-age"), Some("86400"));
        assert!(header_str(&response, "access-control-allow-methods")
            .unwrap()
            .contains("POST"));
        assert!(header_str(&response, "x-ratelimit-limit").is_none());
    }

    let response = send(&app, preflight("/api/slack/incident", "https://evil.example")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_production_excludes_development_origins() {
    let mut config = test_config(10);
    config.governance.environment = Environment::Production;
    let app = app(config);

    let response = send(&app, with_origin("/api/incidents/x", "10.0.0.5", DEV_ORIGIN)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, with_origin("/api/incidents/x", "10.0.0.5", PROD_ORIGIN)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(header_str(&response, "access-control-allow-origin"), Some(PROD_ORIGIN));
}

#[tokio::test]
async fn test_paths_outside_prefix_pass_through() {
    let app = app(test_config(1));

    for _ in 0..5 {
        let response = send(
            &app,
            Request::get("/health")
                .header(header::ORIGIN, "https://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(header_str(&response, "x-ratelimit-limit").is_none());
        assert!(header_str(&response, "access-control-allow-origin").is_none());
    }
}

#[tokio::test]
async fn test_clients_and_paths_are_isolated() {
    let app = app(test_config(1));

    send(&app, get("/api/incidents/a", "10.0.0.6")).await;
    let denied = send(&app, get("/api/incidents/a", "10.0.0.6")).await;
    assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);

    let other_client = send(&app, get("/api/incidents/a", "10.0.0.7")).await;
    assert_ne!(other_client.status(), StatusCode::TOO_MANY_REQUESTS);

    let other_path = send(&app, get("/api/incidents/b", "10.0.0.6")).await;
    assert_ne!(other_path.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_client_identity_fallbacks() {
    let app = app(test_config(1));

    // First X-Forwarded-For entry wins over X-Real-IP.
    let chained = Request::get("/api/incidents/z")
        .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
        .header("x-real-ip", "198.51.100.1")
        .body(Body::empty())
        .unwrap();
    assert_ne!(send(&app, chained).await.status(), StatusCode::TOO_MANY_REQUESTS);
    let response = send(&app, get("/api/incidents/z", "203.0.113.9")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let real_ip = || {
        Request::get("/api/incidents/z")
            .header("x-real-ip", "198.51.100.1")
            .body(Body::empty())
            .unwrap()
    };
    assert_ne!(send(&app, real_ip()).await.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(send(&app, real_ip()).await.status(), StatusCode::TOO_MANY_REQUESTS);

    // No identifying headers: every such client shares one bucket.
    let anonymous = || Request::get("/api/incidents/z").body(Body::empty()).unwrap();
    assert_ne!(send(&app, anonymous()).await.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(send(&app, anonymous()).await.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_request_id_assigned_and_preserved() {
    let app = app(test_config(10));

    let response = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    let generated = header_str(&response, "x-request-id").unwrap();
    assert_eq!(generated.len(), 36);

    let response = send(
        &app,
        Request::get("/health")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(header_str(&response, "x-request-id"), Some("abc-123"));
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn events(&self) -> Vec<serde_json::Value> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

#[tokio::test]
async fn test_denials_log_client_path_origin_and_code() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let app = app(test_config(1));
    let evil = "https://evil.example";

    let rejected_preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/incidents/x")
        .header(header::ORIGIN, evil)
        .header("x-forwarded-for", "10.9.0.1")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, rejected_preflight).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        send(&app, with_origin("/api/incidents/x", "10.9.0.2", evil)).await.status(),
        StatusCode::FORBIDDEN
    );
    send(&app, get("/api/incidents/x", "10.9.0.3")).await;
    assert_eq!(
        send(&app, get("/api/incidents/x", "10.9.0.3")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    let events = logs.events();
    let find = |message: &str| {
        events
            .iter()
            .find(|e| e["message"] == message)
            .unwrap_or_else(|| panic!("no {message:?} event in {events:?}"))
            .clone()
    };

    let preflight = find("Preflight from disallowed origin");
    assert_eq!(preflight["client"], "10.9.0.1");
    assert_eq!(preflight["path"], "/api/incidents/x");
    assert_eq!(preflight["origin"], evil);
    assert_eq!(preflight["code"], "CORS_ERROR");

    let origin = find("Request from disallowed origin");
    assert_eq!(origin["client"], "10.9.0.2");
    assert_eq!(origin["origin"], evil);
    assert_eq!(origin["code"], "CORS_ERROR");

    let limited = find("Rate limit exceeded");
    assert_eq!(limited["client"], "10.9.0.3");
    assert_eq!(limited["origin"], "-");
    assert_eq!(limited["code"], "RATE_LIMIT_EXCEEDED");

    let admitted = find("Request admitted");
    assert_eq!(admitted["client"], "10.9.0.3");
    assert_eq!(admitted["path"], "/api/incidents/x");
}

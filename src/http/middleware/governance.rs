//! Governance middleware.
//! Runs the [`RequestGovernor`] on every request and maps its decision to
//! a response.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::http::request::request_id;
use crate::http::response::{ApiError, ErrorCode};
use crate::observability::metrics;
use crate::security::governor::request_origin;
use crate::security::{Decision, RequestGovernor};

pub async fn governance_middleware(
    State(governor): State<Arc<RequestGovernor>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let path = request.uri().path().to_string();
    let origin = request_origin(request.headers()).unwrap_or("-").to_string();
    let decision = governor.evaluate(request.method(), &path, request.headers());

    match decision {
        Decision::PassThrough => next.run(request).await,
        Decision::PreflightAccepted { client, headers } => {
            debug!(
                request_id = %request_id(&request),
                client = %client,
                path = %path,
                origin = %origin,
                "Preflight accepted"
            );
            metrics::record_request("preflight", start);
            (StatusCode::NO_CONTENT, headers).into_response()
        }
        Decision::PreflightRejected { client } => {
            warn!(
                request_id = %request_id(&request),
                client = %client,
                path = %path,
                origin = %origin,
                code = ErrorCode::CorsError.as_str(),
                "Preflight from disallowed origin"
            );
            metrics::record_cors_rejected(true);
            metrics::record_request("cors_rejected", start);
            StatusCode::FORBIDDEN.into_response()
        }
        Decision::OriginRejected { client } => {
            warn!(
                request_id = %request_id(&request),
                client = %client,
                path = %path,
                origin = %origin,
                code = ErrorCode::CorsError.as_str(),
                "Request from disallowed origin"
            );
            metrics::record_cors_rejected(false);
            metrics::record_request("cors_rejected", start);
            ApiError::origin_not_allowed().into_response()
        }
        Decision::RateLimited {
            client,
            headers,
            retry_after_secs,
            ..
        } => {
            warn!(
                request_id = %request_id(&request),
                client = %client,
                path = %path,
                origin = %origin,
                code = ErrorCode::RateLimitExceeded.as_str(),
                retry_after_secs,
                "Rate limit exceeded"
            );
            let prefix = governor.limiter().limits().matched_prefix(&path).unwrap_or("default");
            metrics::record_rate_limited(prefix);
            metrics::record_request("rate_limited", start);
            (headers, ApiError::rate_limited(retry_after_secs)).into_response()
        }
        Decision::Proceed {
            client,
            headers,
            result,
        } => {
            debug!(
                request_id = %request_id(&request),
                client = %client,
                path = %path,
                origin = %origin,
                remaining = result.remaining,
                "Request admitted"
            );
            let mut response = next.run(request).await;
            response.headers_mut().extend(headers);
            metrics::record_request("allowed", start);
            response
        }
    }
}

//! Request governance: origin policy plus rate limiting in a fixed order.
//!
//! # Sequence
//! ```text
//! path outside guarded prefix     → PassThrough
//! OPTIONS                          → PreflightAccepted | PreflightRejected
//! disallowed origin                → OriginRejected (quota untouched)
//! limiter denies (client, path)    → RateLimited
//! otherwise                        → Proceed
//! ```
//!
//! Evaluation is transport-free: it returns a [`Decision`] and the HTTP
//! layer turns that into a response.

use std::sync::Arc;

use axum::http::header::{HeaderName, ORIGIN, RETRY_AFTER};
use axum::http::{HeaderMap, HeaderValue, Method};

use crate::security::cors::{OriginPolicy, Preflight};
use crate::security::rate_limit::{RateLimitResult, SlidingWindowLimiter};
use crate::security::unix_millis;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";
pub const FALLBACK_CLIENT: &str = "127.0.0.1";

pub static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub static X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// What to do with a request.
#[derive(Debug)]
pub enum Decision {
    /// Not guarded; forward untouched.
    PassThrough,
    /// Preflight from an allowed (or absent) origin: 204 with CORS headers.
    PreflightAccepted { client: String, headers: HeaderMap },
    /// Preflight from a disallowed origin: 403, empty body.
    PreflightRejected { client: String },
    /// Actual request from a disallowed origin: 403 with JSON body.
    OriginRejected { client: String },
    /// Over quota: 429 with CORS and rate limit headers.
    RateLimited {
        client: String,
        headers: HeaderMap,
        result: RateLimitResult,
        retry_after_secs: u64,
    },
    /// Forward, then decorate the response with `headers`.
    Proceed {
        client: String,
        headers: HeaderMap,
        result: RateLimitResult,
    },
}

#[derive(Debug)]
pub struct RequestGovernor {
    guarded_prefix: String,
    origins: OriginPolicy,
    limiter: Arc<SlidingWindowLimiter>,
}

impl RequestGovernor {
    pub fn new(
        guarded_prefix: impl Into<String>,
        origins: OriginPolicy,
        limiter: Arc<SlidingWindowLimiter>,
    ) -> Self {
        Self {
            guarded_prefix: guarded_prefix.into(),
            origins,
            limiter,
        }
    }

    pub fn guarded_prefix(&self) -> &str {
        &self.guarded_prefix
    }

    pub fn origins(&self) -> &OriginPolicy {
        &self.origins
    }

    pub fn limiter(&self) -> &Arc<SlidingWindowLimiter> {
        &self.limiter
    }

    pub fn is_guarded(&self, path: &str) -> bool {
        path.starts_with(&self.guarded_prefix)
    }

    pub fn evaluate(&self, method: &Method, path: &str, headers: &HeaderMap) -> Decision {
        self.evaluate_at(method, path, headers, unix_millis())
    }

    /// Same as [`evaluate`](Self::evaluate) with an explicit clock, in epoch millis.
    pub fn evaluate_at(&self, method: &Method, path: &str, headers: &HeaderMap, now: u64) -> Decision {
        if !self.is_guarded(path) {
            return Decision::PassThrough;
        }

        let origin = request_origin(headers);
        let client = client_identifier(headers);

        if *method == Method::OPTIONS {
            return match self.origins.preflight(origin) {
                Preflight::Accepted(headers) => Decision::PreflightAccepted { client, headers },
                Preflight::Rejected => Decision::PreflightRejected { client },
            };
        }

        if !self.origins.is_origin_allowed(origin) {
            return Decision::OriginRejected { client };
        }

        let result = self.limiter.check_at(&client, path, None, now);

        let mut response_headers = self.origins.cors_headers(origin);
        response_headers.extend(rate_limit_headers(&result, now));

        if result.allowed {
            Decision::Proceed {
                client,
                headers: response_headers,
                result,
            }
        } else {
            Decision::RateLimited {
                client,
                headers: response_headers,
                result,
                retry_after_secs: result.retry_after_secs(now),
            }
        }
    }
}

/// The `Origin` header, with an empty value treated as absent.
pub fn request_origin(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// Client identifier from proxy headers.
///
/// First entry of `X-Forwarded-For`, else `X-Real-IP`, else loopback.
pub fn client_identifier(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(forwarded) = header(X_FORWARDED_FOR) {
        if let Some(first) = forwarded.split(',').next().map(str::trim).filter(|v| !v.is_empty()) {
            return first.to_string();
        }
    }

    header(X_REAL_IP).unwrap_or(FALLBACK_CLIENT).to_string()
}

/// `X-RateLimit-*` headers, plus `Retry-After` when denied.
pub fn rate_limit_headers(result: &RateLimitResult, now: u64) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(4);
    headers.insert(X_RATELIMIT_LIMIT.clone(), HeaderValue::from(result.limit));
    headers.insert(X_RATELIMIT_REMAINING.clone(), HeaderValue::from(result.remaining));
    headers.insert(X_RATELIMIT_RESET.clone(), HeaderValue::from(result.reset_epoch_secs()));
    if !result.allowed {
        headers.insert(RETRY_AFTER, HeaderValue::from(result.retry_after_secs(now)));
    }
    headers
}

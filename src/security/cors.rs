//! Origin policy and CORS headers.
//!
//! The allow-set is fixed at construction: production origins always,
//! development origins only outside production. Matching is exact.

use std::collections::HashSet;

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE, VARY,
};
use axum::http::header::InvalidHeaderValue;
use axum::http::{HeaderMap, HeaderValue};
use thiserror::Error;

use crate::config::{CorsConfig, Environment};

#[derive(Debug, Error)]
pub enum CorsError {
    #[error("invalid CORS {field}: {source}")]
    InvalidHeader {
        field: &'static str,
        #[source]
        source: InvalidHeaderValue,
    },
}

/// Outcome of a preflight (`OPTIONS`) request.
#[derive(Debug)]
pub enum Preflight {
    /// 204 with these headers, no body.
    Accepted(HeaderMap),
    /// 403, no body.
    Rejected,
}

#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed: HashSet<String>,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    max_age: HeaderValue,
}

impl OriginPolicy {
    pub fn new(config: &CorsConfig, environment: Environment) -> Result<Self, CorsError> {
        let mut allowed: HashSet<String> = config.production_origins.iter().cloned().collect();
        if !environment.is_production() {
            allowed.extend(config.development_origins.iter().cloned());
        }

        let header = |field: &'static str, value: String| {
            HeaderValue::try_from(value).map_err(|source| CorsError::InvalidHeader { field, source })
        };

        Ok(Self {
            allowed,
            allow_methods: header("allowed_methods", config.allowed_methods.join(", "))?,
            allow_headers: header("allowed_headers", config.allowed_headers.join(", "))?,
            max_age: HeaderValue::from(config.max_age_secs),
        })
    }

    /// An absent origin is always allowed: no `Origin` header means a
    /// same-origin or non-browser client.
    pub fn is_origin_allowed(&self, origin: Option<&str>) -> bool {
        origin.map_or(true, |origin| self.allowed.contains(origin))
    }

    /// CORS response headers for `origin`.
    ///
    /// The origin is echoed with `Vary: Origin` only when it is present and
    /// allowed.
    pub fn cors_headers(&self, origin: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(5);
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
        headers.insert(ACCESS_CONTROL_MAX_AGE, self.max_age.clone());

        if let Some(origin) = origin.filter(|o| self.allowed.contains(*o)) {
            if let Ok(value) = HeaderValue::from_str(origin) {
                headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
                headers.insert(VARY, HeaderValue::from_static("Origin"));
            }
        }

        headers
    }

    pub fn preflight(&self, origin: Option<&str>) -> Preflight {
        if self.is_origin_allowed(origin) {
            Preflight::Accepted(self.cors_headers(origin))
        } else {
            Preflight::Rejected
        }
    }

    pub fn allowed_origins(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }
}

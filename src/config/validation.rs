//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject non-positive limits and windows before anything is built
//! - Detect ambiguous prefix tables
//! - Check that header-bound strings are valid header values
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::{GatewayConfig, PLACEHOLDER_ADMIN_KEY};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("rate limit `{scope}`: max_requests must be greater than zero")]
    ZeroMaxRequests { scope: String },

    #[error("rate limit `{scope}`: window_secs must be greater than zero")]
    ZeroWindow { scope: String },

    #[error("rate limit prefix `{0}` must start with `/`")]
    InvalidPrefix(String),

    #[error("rate limit prefix `{0}` is configured more than once")]
    DuplicatePrefix(String),

    #[error("guarded prefix `{0}` must start with `/`")]
    InvalidGuardedPrefix(String),

    #[error("slack tolerance_secs must be greater than zero")]
    ZeroTolerance,

    #[error("origin `{0}` is not a valid header value")]
    InvalidOrigin(String),

    #[error("cors {0} list produces an invalid header value")]
    InvalidHeaderList(&'static str),

    #[error("admin API is enabled with the placeholder api_key")]
    PlaceholderAdminKey,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let limits = &config.rate_limit;
    check_limit("default", limits.default.max_requests, limits.default.window_secs, &mut errors);

    let mut seen = HashSet::new();
    for route in &limits.routes {
        if !route.prefix.starts_with('/') {
            errors.push(ValidationError::InvalidPrefix(route.prefix.clone()));
        }
        if !seen.insert(route.prefix.as_str()) {
            errors.push(ValidationError::DuplicatePrefix(route.prefix.clone()));
        }
        check_limit(&route.prefix, route.max_requests, route.window_secs, &mut errors);
    }

    if !config.governance.guarded_prefix.starts_with('/') {
        errors.push(ValidationError::InvalidGuardedPrefix(
            config.governance.guarded_prefix.clone(),
        ));
    }

    if config.slack.tolerance_secs == 0 {
        errors.push(ValidationError::ZeroTolerance);
    }

    let cors = &config.cors;
    for origin in cors.production_origins.iter().chain(&cors.development_origins) {
        if HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }
    if HeaderValue::from_str(&cors.allowed_methods.join(", ")).is_err() {
        errors.push(ValidationError::InvalidHeaderList("allowed_methods"));
    }
    if HeaderValue::from_str(&cors.allowed_headers.join(", ")).is_err() {
        errors.push(ValidationError::InvalidHeaderList("allowed_headers"));
    }

    if config.admin.enabled && config.admin.api_key == PLACEHOLDER_ADMIN_KEY {
        errors.push(ValidationError::PlaceholderAdminKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_limit(scope: &str, max_requests: u32, window_secs: u64, errors: &mut Vec<ValidationError>) {
    if max_requests == 0 {
        errors.push(ValidationError::ZeroMaxRequests { scope: scope.to_string() });
    }
    if window_secs == 0 {
        errors.push(ValidationError::ZeroWindow { scope: scope.to_string() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteLimitSettings;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.rate_limit.default.max_requests = 0;
        config.rate_limit.routes.push(RouteLimitSettings {
            prefix: "api/".to_string(),
            max_requests: 1,
            window_secs: 0,
        });
        config.slack.tolerance_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroMaxRequests { scope: "default".into() }));
        assert!(errors.contains(&ValidationError::InvalidPrefix("api/".into())));
        assert!(errors.contains(&ValidationError::ZeroWindow { scope: "api/".into() }));
        assert!(errors.contains(&ValidationError::ZeroTolerance));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_duplicate_prefix() {
        let mut config = GatewayConfig::default();
        config.rate_limit.routes.push(RouteLimitSettings {
            prefix: "/api/".to_string(),
            max_requests: 10,
            window_secs: 60,
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::DuplicatePrefix("/api/".into())]);
    }

    #[test]
    fn test_invalid_origin_and_admin_key() {
        let mut config = GatewayConfig::default();
        config.cors.production_origins.push("https://bad\norigin".to_string());
        config.admin.enabled = true;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::PlaceholderAdminKey));
        assert!(matches!(errors[0], ValidationError::InvalidOrigin(_)));
    }
}

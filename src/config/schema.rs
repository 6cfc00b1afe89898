//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, timeouts, body limit).
    pub listener: ListenerConfig,

    /// Which paths are guarded and in which environment mode we run.
    pub governance: GovernanceConfig,

    /// Sliding-window rate limits per path prefix.
    pub rate_limit: RateLimitSettings,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Slack webhook verification.
    pub slack: SlackConfig,

    /// Admin API.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body size.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Runtime environment mode.
///
/// Development mode widens the origin allow-list with local origins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => f.write_str("production"),
            Environment::Development => f.write_str("development"),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(format!("unknown environment `{other}`")),
        }
    }
}

/// Governance configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Requests under this prefix pass through the governor.
    pub guarded_prefix: String,

    /// Environment mode.
    pub environment: Environment,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            guarded_prefix: "/api/".to_string(),
            environment: Environment::Production,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Limit applied when no route prefix matches.
    pub default: LimitSettings,

    /// Per-prefix limits. Order does not matter; the longest prefix wins.
    pub routes: Vec<RouteLimitSettings>,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            default: LimitSettings {
                max_requests: 100,
                window_secs: 60,
            },
            routes: vec![
                RouteLimitSettings {
                    prefix: "/api/slack/".to_string(),
                    max_requests: 30,
                    window_secs: 60,
                },
                RouteLimitSettings {
                    prefix: "/api/".to_string(),
                    max_requests: 60,
                    window_secs: 60,
                },
            ],
        }
    }
}

/// A bare limit: requests allowed per window.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct LimitSettings {
    pub max_requests: u32,
    pub window_secs: u64,
}

/// A limit bound to a path prefix.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteLimitSettings {
    pub prefix: String,
    pub max_requests: u32,
    pub window_secs: u64,
}

/// Cross-origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed in every environment.
    pub production_origins: Vec<String>,

    /// Origins additionally allowed outside production.
    pub development_origins: Vec<String>,

    pub allowed_methods: Vec<String>,

    pub allowed_headers: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            production_origins: vec![
                "https://roosevelt-ops.vercel.app".to_string(),
                "https://rooseveltops.com".to_string(),
            ],
            development_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            allowed_methods: ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_headers: [
                "Content-Type",
                "Authorization",
                "X-Request-ID",
                "X-Slack-Signature",
                "X-Slack-Request-Timestamp",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_age_secs: 86_400,
        }
    }
}

/// Slack webhook configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Signing secret. Usually supplied via `SLACK_SIGNING_SECRET`.
    pub signing_secret: Option<String>,

    /// Allowed clock skew for request timestamps, both directions.
    pub tolerance_secs: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            signing_secret: None,
            tolerance_secs: 300,
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

/// Placeholder key rejected by validation when the admin API is enabled.
pub const PLACEHOLDER_ADMIN_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: PLACEHOLDER_ADMIN_KEY.to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

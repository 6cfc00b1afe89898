//! Top-level error type for building and running the gateway.

use thiserror::Error;

use crate::config::ConfigError;
use crate::security::cors::CorsError;
use crate::security::rate_limit::LimitError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid rate limit: {0}")]
    Limit(#[from] LimitError),

    #[error(transparent)]
    Cors(#[from] CorsError),

    #[error("invalid address {address}: {source}")]
    Address {
        address: String,
        source: std::net::AddrParseError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

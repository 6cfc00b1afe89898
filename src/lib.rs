//! Request governance gateway library.

pub mod admin;
pub mod config;
pub mod error;
pub mod http;
pub mod incident;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), optional
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides: secret, mode, admin key)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → consumed once at startup to build the governor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the origin set and limit table are
//!   fixed for the process lifetime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    AdminConfig, CorsConfig, Environment, GatewayConfig, GovernanceConfig, ListenerConfig,
    LogFormat, ObservabilityConfig, RateLimitSettings, RouteLimitSettings, SlackConfig,
};

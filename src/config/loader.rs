//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{Environment, GatewayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the Slack signing secret.
pub const ENV_SIGNING_SECRET: &str = "SLACK_SIGNING_SECRET";
/// Environment variable selecting the environment mode.
pub const ENV_MODE: &str = "GATEWAY_ENV";
/// Environment variable holding the admin API key.
pub const ENV_ADMIN_KEY: &str = "GATEWAY_ADMIN_KEY";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("GATEWAY_ENV: {0}")]
    Environment(String),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, then apply
/// environment overrides.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: GatewayConfig = toml::from_str(&content)?;

    apply_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build a configuration from defaults and environment overrides only.
pub fn load_from_env() -> Result<GatewayConfig, ConfigError> {
    let mut config = GatewayConfig::default();

    apply_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment-style overrides through `lookup`.
///
/// Empty values are treated as unset.
pub fn apply_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

    if let Some(secret) = lookup(ENV_SIGNING_SECRET) {
        config.slack.signing_secret = Some(secret);
    }

    if let Some(mode) = lookup(ENV_MODE) {
        config.governance.environment = mode
            .parse::<Environment>()
            .map_err(ConfigError::Environment)?;
    }

    if let Some(key) = lookup(ENV_ADMIN_KEY) {
        config.admin.api_key = key;
    }

    Ok(())
}

//! Process configuration.
//!
//! Configuration comes from the environment and is resolved once at startup;
//! the values are injected into [`crate::server::AppState`] from `main`.
//! Nothing else in the crate reads environment variables.

use std::net::SocketAddr;

use thiserror::Error;

/// Environment variable holding the shared webhook secret.
pub const SECRET_ENV: &str = "ISSUE_LEDGER_SECRET";

/// Environment variable holding the listen address.
pub const ADDR_ENV: &str = "ISSUE_LEDGER_ADDR";

/// Listen address used when none is configured.
const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The webhook secret is unset or empty.
    #[error("ISSUE_LEDGER_SECRET must be set to the webhook secret shared with the tracker")]
    MissingSecret,

    /// The listen address does not parse.
    #[error("invalid listen address: {0:?}")]
    InvalidAddr(String),
}

/// Resolved process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// Shared secret for webhook signature verification.
    pub webhook_secret: Vec<u8>,
}

impl Config {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::from_values(
            std::env::var(SECRET_ENV).ok(),
            std::env::var(ADDR_ENV).ok(),
        )
    }

    /// Resolves configuration from explicit values.
    fn from_values(secret: Option<String>, addr: Option<String>) -> Result<Self, ConfigError> {
        let secret = secret.filter(|s| !s.is_empty()).ok_or(ConfigError::MissingSecret)?;

        let addr = addr.unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let bind_addr = addr
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(addr))?;

        Ok(Config {
            bind_addr,
            webhook_secret: secret.into_bytes(),
        })
    }
}

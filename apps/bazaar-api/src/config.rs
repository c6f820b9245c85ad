//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Signing secret used when `JWT_SECRET` is unset. Never use it in production.
pub const DEV_JWT_SECRET: &str = "bazaar-dev-secret-change-in-production";

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// HS256 secret for verifying bearer credentials
    pub jwt_secret: String,

    /// ISO currency code sent to the payment provider
    pub payment_currency: String,

    /// Retries after the first failed payment attempt
    pub payment_max_retries: u32,

    /// Per-attempt timeout for the payment provider
    pub payment_timeout: Duration,

    /// First retry delay; doubles on each retry
    pub payment_initial_backoff: Duration,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string());
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }

        let currency = lookup("PAYMENT_CURRENCY").unwrap_or_else(|| "egp".to_string());
        if currency.trim().is_empty() {
            return Err(ConfigError::InvalidValue("PAYMENT_CURRENCY".to_string()));
        }

        Ok(ApiConfig {
            port: parse(&lookup, "BAZAAR_PORT", 5000)?,
            database_path: lookup("BAZAAR_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./bazaar.db")),
            db_max_connections: parse(&lookup, "BAZAAR_DB_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            payment_currency: currency.trim().to_lowercase(),
            payment_max_retries: parse(&lookup, "PAYMENT_MAX_RETRIES", 3)?,
            payment_timeout: Duration::from_millis(parse(&lookup, "PAYMENT_TIMEOUT_MS", 5000)?),
            payment_initial_backoff: Duration::from_millis(parse(
                &lookup,
                "PAYMENT_INITIAL_BACKOFF_MS",
                200,
            )?),
        })
    }

    /// True when running on the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

/// Signing key used when `JWT_SIGNING_KEY` is unset outside production
const DEVELOPMENT_SIGNING_KEY: &str = "coinshop-development-signing-key";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// How long to wait for a pooled connection
    pub database_acquire_timeout: Duration,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// HS256 secret for bearer tokens
    pub jwt_signing_key: String,

    pub token_ttl: Duration,

    /// Apply `migrations/` on startup
    pub run_migrations: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;

        let acquire_secs: u64 = parse_or(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = parse_or(&lookup, "PORT", 8080)?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let jwt_signing_key = match lookup("JWT_SIGNING_KEY") {
            Some(key) if !key.is_empty() => key,
            _ if environment == "production" => {
                return Err(ConfigError::MissingEnv("JWT_SIGNING_KEY"))
            }
            _ => DEVELOPMENT_SIGNING_KEY.to_string(),
        };

        let ttl_hours: u64 = parse_or(&lookup, "TOKEN_TTL_HOURS", 12)?;

        let run_migrations = parse_or(&lookup, "RUN_MIGRATIONS", true)?;

        let log_json = lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json"));

        Ok(Self {
            database_url,
            database_max_connections,
            database_acquire_timeout: Duration::from_secs(acquire_secs),
            host,
            port,
            environment,
            jwt_signing_key,
            token_ttl: Duration::from_secs(ttl_hours * 3600),
            run_migrations,
            log_json,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue(key)),
        None => Ok(default),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

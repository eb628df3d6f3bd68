//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::Duration;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// When absent the service runs on the in-memory store.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub api_prefix: String,
    pub cors_origins: Vec<String>,
    pub session_ttl: Duration,
    pub cookie_secure: bool,
    pub catalog_timeout: std::time::Duration,
    pub google_books_api_key: Option<String>,
    pub identity_session_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8001)),
            database_url: None,
            log_level: Level::INFO,
            api_prefix: "/api".to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            session_ttl: Duration::days(7),
            cookie_secure: true,
            catalog_timeout: std::time::Duration::from_secs(10),
            google_books_api_key: None,
            identity_session_url: None,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // --- Server and Database Settings ---
        let bind_address = match lookup("BIND_ADDRESS") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            None => defaults.bind_address,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let api_prefix = match lookup("API_PREFIX") {
            Some(prefix) => normalize_prefix(&prefix),
            None => defaults.api_prefix,
        };

        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(raw) => parse_origins(&raw)?,
            None => defaults.cors_origins,
        };

        // --- Sessions ---
        let session_ttl = match lookup("SESSION_TTL_DAYS") {
            Some(raw) => {
                let days = parse_positive("SESSION_TTL_DAYS", &raw)?;
                Duration::days(days as i64)
            }
            None => defaults.session_ttl,
        };

        let cookie_secure = match lookup("COOKIE_SECURE") {
            Some(raw) => parse_bool("COOKIE_SECURE", &raw)?,
            None => defaults.cookie_secure,
        };

        // --- Adapter-specific Settings ---
        let catalog_timeout = match lookup("CATALOG_TIMEOUT_SECS") {
            Some(raw) => std::time::Duration::from_secs(parse_positive("CATALOG_TIMEOUT_SECS", &raw)?),
            None => defaults.catalog_timeout,
        };

        let google_books_api_key = lookup("GOOGLE_BOOKS_API_KEY");
        let identity_session_url = lookup("IDENTITY_SESSION_URL");

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            api_prefix,
            cors_origins,
            session_ttl,
            cookie_secure,
            catalog_timeout,
            google_books_api_key,
            identity_session_url,
        })
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a positive integer", raw),
        )),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a boolean", raw),
        )),
    }
}

/// Comma-separated explicit origins. The session cookie needs credentialed
/// CORS, which browsers refuse for a wildcard origin, so `*` is rejected.
fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();
    if origins.iter().any(|origin| origin == "*") {
        return Err(ConfigError::InvalidValue(
            "CORS_ORIGINS".to_string(),
            "'*' cannot be combined with credentialed requests; list the origins explicitly"
                .to_string(),
        ));
    }
    Ok(origins)
}

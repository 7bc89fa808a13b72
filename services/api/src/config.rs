//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Secrets and lifetimes used by the token service.
#[derive(Clone, Debug)]
pub struct TokenConfig {
    pub activation_secret: String,
    pub access_secret: String,
    pub refresh_secret: String,
    /// Access token lifetime in seconds (default: 300 = 5 minutes).
    pub access_ttl_secs: u64,
    /// Refresh token lifetime in seconds (default: 259_200 = 3 days).
    pub refresh_ttl_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub redis_url: String,
    pub log_level: Level,
    /// Enables the `Secure` attribute on session cookies.
    pub production: bool,
    pub cors_origin: String,
    pub tokens: TokenConfig,
    pub smtp: SmtpConfig,
    pub cloudinary: CloudinaryConfig,
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
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

        // --- Load Server, Database and Cache Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = required("DATABASE_URL")?;
        let redis_url = required("REDIS_URL")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let production = std::env::var("APP_ENV")
            .map(|env| env.eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Load Token Settings ---
        let tokens = TokenConfig {
            activation_secret: required("ACTIVATION_SECRET")?,
            access_secret: required("ACCESS_TOKEN")?,
            refresh_secret: required("REFRESH_TOKEN")?,
            access_ttl_secs: parsed_or("ACCESS_TOKEN_EXPIRE", 300)?,
            refresh_ttl_secs: parsed_or("REFRESH_TOKEN_EXPIRE", 259_200)?,
        };

        // --- Load Adapter-specific Settings ---
        let smtp = SmtpConfig {
            host: required("SMTP_HOST")?,
            port: parsed_or("SMTP_PORT", 587)?,
            username: std::env::var("SMTP_MAIL").unwrap_or_default(),
            password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
        };
        let cloudinary = CloudinaryConfig {
            cloud_name: required("CLOUD_NAME")?,
            api_key: required("CLOUD_API_KEY")?,
            api_secret: required("CLOUD_SECRET_KEY")?,
        };

        Ok(Self {
            bind_address,
            database_url,
            redis_url,
            log_level,
            production,
            cors_origin,
            tokens,
            smtp,
            cloudinary,
        })
    }
}

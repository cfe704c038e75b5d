//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `REWARDS_DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `REWARDS_HOST` - Bind address (default: 127.0.0.1)
//! - `REWARDS_PORT` - Listen port (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag (default: development)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Rewards service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: String,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = require_var("REWARDS_DATABASE_URL").map(SecretString::from)?;

        let host = optional_var("REWARDS_HOST")
            .unwrap_or_else(|| "127.0.0.1".to_owned())
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("REWARDS_HOST".to_owned(), e.to_string()))?;

        let port = optional_var("REWARDS_PORT")
            .unwrap_or_else(|| "3000".to_owned())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("REWARDS_PORT".to_owned(), e.to_string()))?;

        Ok(Self {
            database_url,
            host,
            port,
            sentry_dsn: optional_var("SENTRY_DSN"),
            sentry_environment: optional_var("SENTRY_ENVIRONMENT")
                .unwrap_or_else(|| "development".to_owned()),
        })
    }

    /// The socket address to bind the server to.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn require_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_combines_host_and_port() {
        let config = ServiceConfig {
            database_url: SecretString::from("postgres://localhost/rewards".to_owned()),
            host: "0.0.0.0".parse().expect("valid addr"),
            port: 4000,
            sentry_dsn: None,
            sentry_environment: "development".to_owned(),
        };
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:4000");
    }
}

//! Store API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults suitable for local development.

use serde::{Deserialize, Serialize};
use std::env;

/// Store API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// JWT refresh token lifetime in seconds
    pub jwt_refresh_lifetime_secs: i64,

    /// Allowed CORS origins (comma-separated in the environment)
    pub cors_origins: Vec<String>,

    /// Lifetime of issued download references in seconds
    pub download_link_lifetime_secs: i64,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./bookvault_dev.db".to_string()),

            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                // In production, this MUST be set via environment variable
                "bookvault-dev-secret-change-in-production".to_string()
            }),

            jwt_access_lifetime_secs: env::var("JWT_ACCESS_LIFETIME_SECS")
                .unwrap_or_else(|_| "3600".to_string()) // 1 hour
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_ACCESS_LIFETIME_SECS".to_string()))?,

            jwt_refresh_lifetime_secs: env::var("JWT_REFRESH_LIFETIME_SECS")
                .unwrap_or_else(|_| "2592000".to_string()) // 30 days
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_REFRESH_LIFETIME_SECS".to_string()))?,

            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:5173".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),

            download_link_lifetime_secs: env::var("DOWNLOAD_LINK_LIFETIME_SECS")
                .unwrap_or_else(|_| "3600".to_string()) // 1 hour
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("DOWNLOAD_LINK_LIFETIME_SECS".to_string())
                })?,
        };

        if config.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }

        Ok(config)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load() {
        // No env vars set in the test harness; defaults must produce a
        // usable config
        let config = ApiConfig::load().unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.jwt_access_lifetime_secs, 3600);
        assert!(!config.cors_origins.is_empty());
    }
}

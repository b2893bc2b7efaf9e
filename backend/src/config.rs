//! Configuration management for LawnSync
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with LAWNSYNC__ prefix
//!
//! The loaded [`Config`] is the only source of secrets and feature switches;
//! components receive the section they need instead of reading the process
//! environment.

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Weather API configuration
    pub weather: WeatherConfig,

    /// Transactional email configuration
    pub email: EmailConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,

    /// Refresh token expiration in seconds
    pub refresh_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Weather API endpoint
    pub api_endpoint: String,

    /// Weather API key
    pub api_key: String,

    /// Unit system passed to the provider (imperial, metric)
    pub units: String,

    /// How long a fetched forecast stays fresh
    pub cache_ttl_minutes: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    /// Email provider endpoint
    pub api_endpoint: String,

    /// Email provider API key
    pub api_key: String,

    /// Sender address, e.g. "LawnSync <notifications@lawnsync.app>"
    pub from_address: String,

    /// Public URL of the web app, used for links in emails
    pub app_url: String,

    /// Key for signing unsubscribe links
    pub unsubscribe_secret: String,

    /// When false, emails are rendered and logged but not sent
    pub enabled: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("LAWNSYNC_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 3600)?
            .set_default("jwt.refresh_token_expiry", 2_592_000)?
            .set_default("weather.api_endpoint", "https://api.openweathermap.org/data/2.5")?
            .set_default("weather.api_key", "")?
            .set_default("weather.units", "imperial")?
            .set_default("weather.cache_ttl_minutes", 180)?
            .set_default("email.api_endpoint", "https://api.resend.com")?
            .set_default("email.api_key", "")?
            .set_default("email.from_address", "LawnSync <notifications@lawnsync.app>")?
            .set_default("email.app_url", "http://localhost:3000")?
            .set_default("email.enabled", false)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (LAWNSYNC__ prefix)
            .add_source(
                Environment::with_prefix("LAWNSYNC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would silently break the server
    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < 16 {
            return Err(ConfigError::Message(
                "jwt.secret must be at least 16 characters".to_string(),
            ));
        }
        if self.email.enabled && self.email.api_key.is_empty() {
            return Err(ConfigError::Message(
                "email.api_key is required when email.enabled is true".to_string(),
            ));
        }
        if self.email.unsubscribe_secret.is_empty() {
            return Err(ConfigError::Message(
                "email.unsubscribe_secret must be set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Configuration used by unit tests across the crate
    pub(crate) fn test_config() -> Config {
        Config {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgres://localhost/lawnsync_test".to_string(),
                max_connections: 1,
                min_connections: 1,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-0123456789".to_string(),
                access_token_expiry: 3600,
                refresh_token_expiry: 86400,
            },
            weather: WeatherConfig {
                api_endpoint: "http://localhost:9999".to_string(),
                api_key: "test".to_string(),
                units: "imperial".to_string(),
                cache_ttl_minutes: 60,
            },
            email: EmailConfig {
                api_endpoint: "http://localhost:9998".to_string(),
                api_key: String::new(),
                from_address: "LawnSync <test@lawnsync.test>".to_string(),
                app_url: "https://app.lawnsync.test".to_string(),
                unsubscribe_secret: "unsubscribe-secret".to_string(),
                enabled: false,
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut config = test_config();
        config.jwt.secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enabled_email_requires_key() {
        let mut config = test_config();
        config.email.enabled = true;
        assert!(config.validate().is_err());
        config.email.api_key = "re_123".to_string();
        assert!(config.validate().is_ok());
    }
}

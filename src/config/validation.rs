//! Configuration validation logic
//!
//! Validation methods for all configuration structures, run once after the
//! layered configuration has been loaded.

use crate::config::error::ConfigError;
use crate::config::settings::{
    AnalyticsConfig, AuthConfig, CounterSyncConfig, DatabaseConfig, FileSettings, LoggerSettings,
    LoyaltyConfig, ServerConfig, Settings, UserServiceConfig,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

/// HS256 secrets shorter than this are rejected
const MIN_SECRET_LEN: usize = 32;

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl ServerConfig {
    /// Validate server configuration
    ///
    /// # Validation Rules
    /// - Port must be between 1 and 65535
    /// - Request timeout must be greater than 0
    /// - Keep-alive timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Validate database configuration
    ///
    /// # Validation Rules
    /// - URL must be a non-empty `postgres://` or `postgresql://` URL
    /// - Min and max connections must be positive with min <= max
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required. Please specify a valid database connection string.",
            ));
        }

        if !(self.url.starts_with("postgres://") || self.url.starts_with("postgresql://")) {
            return Err(ConfigError::validation(
                "database.url",
                "Invalid database URL format. Expected format: postgres://[user:password@]host[:port]/database",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections == 0 {
            return Err(ConfigError::validation(
                "database.min_connections",
                "Min connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::ValidationError {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            });
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        self.file.validate()
    }
}

impl AuthConfig {
    /// Validate token verification settings
    ///
    /// # Validation Rules
    /// - At least one of `jwks_url` and `hs256_secret` is set
    /// - `jwks_url` is an http(s) URL
    /// - `hs256_secret` is at least 32 characters
    /// - `allowed_roles` is not empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (&self.jwks_url, &self.hs256_secret) {
            (None, None) => {
                return Err(ConfigError::validation(
                    "auth",
                    "Either auth.jwks_url or auth.hs256_secret must be configured.",
                ));
            }
            (Some(url), _) if !is_http_url(url) => {
                return Err(ConfigError::validation(
                    "auth.jwks_url",
                    "JWKS URL must start with http:// or https://.",
                ));
            }
            (_, Some(secret)) if secret.len() < MIN_SECRET_LEN => {
                return Err(ConfigError::ValidationError {
                    field: "auth.hs256_secret".to_string(),
                    message: format!(
                        "Shared secret should be at least {} characters.",
                        MIN_SECRET_LEN
                    ),
                });
            }
            _ => {}
        }

        if self.allowed_roles.iter().all(|r| r.trim().is_empty()) {
            return Err(ConfigError::validation(
                "auth.allowed_roles",
                "At least one allowed role is required.",
            ));
        }

        Ok(())
    }
}

impl UserServiceConfig {
    /// Validate user-service connection settings. OAuth credentials are
    /// checked lazily when a token is first requested.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_http_url(&self.base_url) {
            return Err(ConfigError::validation(
                "user_service.base_url",
                "User-service base URL must start with http:// or https://.",
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "user_service.timeout_seconds",
                "Timeout must be greater than 0 seconds.",
            ));
        }

        if let Some(url) = &self.oauth.token_url
            && !is_http_url(url)
        {
            return Err(ConfigError::validation(
                "user_service.oauth.token_url",
                "Token URL must start with http:// or https://.",
            ));
        }

        Ok(())
    }
}

/// Ten years
const MAX_COUPON_VALIDITY_DAYS: i64 = 3650;
const MAX_RETRIES: u32 = 10;
const MAX_RETRY_DELAY_MS: u64 = 60_000;
const MAX_RETRY_BACKOFF: f64 = 10.0;

impl LoyaltyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_COUPON_VALIDITY_DAYS).contains(&self.coupon_validity_days) {
            return Err(ConfigError::validation(
                "loyalty.coupon_validity_days",
                format!(
                    "Coupon validity must be between 1 and {} days.",
                    MAX_COUPON_VALIDITY_DAYS
                ),
            ));
        }
        Ok(())
    }
}

impl AnalyticsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.remote_customer_limit == 0 {
            return Err(ConfigError::validation(
                "analytics.remote_customer_limit",
                "Remote customer limit must be greater than 0.",
            ));
        }
        Ok(())
    }
}

impl CounterSyncConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::validation(
                "counter_sync.queue_capacity",
                "Queue capacity must be greater than 0.",
            ));
        }

        if !(1.0..=MAX_RETRY_BACKOFF).contains(&self.retry_backoff) {
            return Err(ConfigError::validation(
                "counter_sync.retry_backoff",
                format!("Retry backoff must be between 1.0 and {}.", MAX_RETRY_BACKOFF),
            ));
        }

        if self.max_retries > MAX_RETRIES {
            return Err(ConfigError::validation(
                "counter_sync.max_retries",
                format!("At most {} retries are allowed.", MAX_RETRIES),
            ));
        }

        if self.retry_delay_ms > MAX_RETRY_DELAY_MS {
            return Err(ConfigError::validation(
                "counter_sync.retry_delay_ms",
                format!("Retry delay must be at most {} ms.", MAX_RETRY_DELAY_MS),
            ));
        }

        Ok(())
    }
}

impl Settings {
    /// Validate all configuration settings, returning the first error found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logger.validate()?;
        self.auth.validate()?;
        self.user_service.validate()?;
        self.loyalty.validate()?;
        self.analytics.validate()?;
        self.counter_sync.validate()?;
        Ok(())
    }
}

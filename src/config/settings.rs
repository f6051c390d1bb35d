//! Configuration settings structures for loyalty-rs
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "loyalty-rs".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/loyalty.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_allowed_roles() -> Vec<String> {
    ["admin", "brand_manager", "manager", "owner", "staff"]
        .iter()
        .map(|r| r.to_string())
        .collect()
}

fn default_jwks_cache_seconds() -> u64 {
    300
}

fn default_user_service_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_user_service_timeout() -> u64 {
    10
}

fn default_refresh_skew_seconds() -> u64 {
    30
}

fn default_coupon_validity_days() -> i64 {
    30
}

fn default_remote_customer_limit() -> u32 {
    10_000
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_retry_backoff() -> f64 {
    2.0
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// Axum HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Requests running longer than this many seconds get a 408
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,


    /// Origins allowed by CORS. Empty means any origin.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Get the full server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

// ============================================================================
// Database Configuration
// ============================================================================

/// Diesel database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Whether to automatically run pending migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout: default_connection_timeout(),
            auto_migrate: false,
        }
    }
}

// ============================================================================
// Auth Configuration
// ============================================================================

/// Bearer token verification settings.
///
/// Tokens are verified against the identity provider's JWKS when `jwks_url`
/// is set; `hs256_secret` is accepted for local setups that sign their own
/// tokens. One of the two must be configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWKS endpoint, e.g. `https://sso.example.com/realms/loyalty/protocol/openid-connect/certs`
    #[serde(default)]
    pub jwks_url: Option<String>,

    /// Expected `iss` claim
    #[serde(default)]
    pub issuer: Option<String>,

    /// Expected `aud` claim
    #[serde(default)]
    pub audience: Option<String>,

    /// Shared secret for HS256-signed tokens
    #[serde(default)]
    pub hs256_secret: Option<String>,

    /// Roles allowed to call the business API (compared case-insensitively)
    #[serde(default = "default_allowed_roles")]
    pub allowed_roles: Vec<String>,

    /// How long fetched signing keys are reused before the JWKS is fetched again
    #[serde(default = "default_jwks_cache_seconds")]
    pub jwks_cache_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwks_url: None,
            issuer: None,
            audience: None,
            hs256_secret: None,
            allowed_roles: default_allowed_roles(),
            jwks_cache_seconds: default_jwks_cache_seconds(),
        }
    }
}

// ============================================================================
// User Service Configuration
// ============================================================================

/// OAuth client-credentials used for service-to-service calls.
///
/// Credentials are optional at startup; a request that needs them fails with
/// a configuration error instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthClientConfig {
    #[serde(default)]
    pub token_url: Option<String>,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    /// Refresh the cached token this many seconds before it expires
    #[serde(default = "default_refresh_skew_seconds")]
    pub refresh_skew_seconds: u64,
}

impl Default for OAuthClientConfig {
    fn default() -> Self {
        Self {
            token_url: None,
            client_id: None,
            client_secret: None,
            refresh_skew_seconds: default_refresh_skew_seconds(),
        }
    }
}

/// Connection settings for the user-service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserServiceConfig {
    #[serde(default = "default_user_service_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_user_service_timeout")]
    pub timeout_seconds: u64,

    #[serde(default)]
    pub oauth: OAuthClientConfig,
}

impl Default for UserServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_user_service_url(),
            timeout_seconds: default_user_service_timeout(),
            oauth: OAuthClientConfig::default(),
        }
    }
}

// ============================================================================
// Loyalty / Analytics / Counter sync
// ============================================================================

/// Business rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyConfig {
    /// Business used when a request names none
    #[serde(default)]
    pub default_business_id: Option<Uuid>,

    /// Days until a newly created coupon expires
    #[serde(default = "default_coupon_validity_days")]
    pub coupon_validity_days: i64,
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self {
            default_business_id: None,
            coupon_validity_days: default_coupon_validity_days(),
        }
    }
}

/// Where the analytics "total customers" figure comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CustomerCountSource {
    /// Members reported by the user-service bulk query
    #[default]
    Remote,
    /// Distinct users that hold at least one stamp locally
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub customer_count_source: CustomerCountSource,

    /// Upper bound on users fetched when counting remotely
    #[serde(default = "default_remote_customer_limit")]
    pub remote_customer_limit: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            customer_count_source: CustomerCountSource::default(),
            remote_customer_limit: default_remote_customer_limit(),
        }
    }
}

/// Background membership counter synchronisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterSyncConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Jobs buffered before new ones are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Retries after the first failed push
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Multiplier applied to the delay on each further retry
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: f64,
}

impl Default for CounterSyncConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            queue_capacity: default_queue_capacity(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            retry_backoff: default_retry_backoff(),
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    /// Whether to append to an existing file
    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert the file representation into the runtime `LoggerConfig`
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console_config = ConsoleConfig::new(self.console.enabled, self.console.colored);
        let file_config = self.file.into_file_config()?;

        LoggerConfig::new(console_config, file_config, self.level).map_err(|e| {
            ConfigError::ValidationError {
                field: "logger".to_string(),
                message: e.to_string(),
            }
        })
    }
}

impl FileSettings {
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format = self
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: e.to_string(),
            })?;

        FileConfig::new(self.enabled, PathBuf::from(self.path), self.append, format).map_err(
            |e| ConfigError::ValidationError {
                field: "logger.file".to_string(),
                message: e.to_string(),
            },
        )
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logger: LoggerSettings,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub user_service: UserServiceConfig,

    #[serde(default)]
    pub loyalty: LoyaltyConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub counter_sync: CounterSyncConfig,
}

//! Configuration management for loyalty-rs
//!
//! Layered configuration loading, lowest to highest priority:
//! 1. `default.toml` - base configuration (required)
//! 2. `{environment}.toml` - environment-specific configuration
//! 3. `local.toml` - local overrides, not committed
//! 4. `LOYALTY_*` environment variables (`__` separates nested keys)

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use loader::ConfigLoader;
pub use settings::{
    AnalyticsConfig, AuthConfig, CounterSyncConfig, CustomerCountSource, DatabaseConfig,
    LoyaltyConfig, Settings, UserServiceConfig,
};

//! Deployment environment, selecting the `{environment}.toml` layer

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    /// Variable read by [`Environment::from_env`]
    pub const ENV_VAR: &'static str = "LOYALTY_APP_ENV";

    /// Reads `LOYALTY_APP_ENV`, falling back to `Development` when it is
    /// unset or unrecognised.
    pub fn from_env() -> Self {
        match std::env::var(Self::ENV_VAR) {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                eprintln!("{}; using development", e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::UnknownEnvironment(s.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

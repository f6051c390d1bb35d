//! Errors raised while loading or validating settings

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A loaded value breaks a rule; `field` is the dotted settings path
    #[error("Invalid setting `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("Unknown environment '{0}' (expected development, test or production)")]
    UnknownEnvironment(String),

    /// `LOYALTY_CONFIG_DIR` and `LOYALTY_CONFIG_FILE` were both set
    #[error("Conflicting configuration sources: {0}")]
    MutualExclusivityError(String),

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        ConfigError::FileNotFound(path.into())
    }

    pub fn mutual_exclusivity(message: impl Into<String>) -> Self {
        ConfigError::MutualExclusivityError(message.into())
    }

    /// Dotted path of the offending setting, when there is one
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::ValidationError { field, .. } => Some(field),
            _ => None,
        }
    }
}

use crate::error::DatabaseErrorConverter;
use serde::Serialize;
use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

/// Application-wide error type that represents all possible errors in the system.
///
/// Every handler returns `AppResult<T>`; the HTTP mapping lives in
/// `api::middleware::error_handler`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found error with entity, field, and value information
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// Duplicate entry error for unique constraint violations
    #[error("Duplicate entry: {entity}.{field} = '{value}' already exists")]
    Duplicate {
        entity: String,
        field: String,
        value: String,
    },

    /// Validation error for a single field
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Validation errors collected from a request body
    #[error("Validation failed: {} field error(s)", errors.len())]
    ValidationErrors { errors: Vec<ValidationFieldError> },

    /// Bad request error with descriptive message
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Unauthorized access error with authentication message
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Forbidden access error with authorization message
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// A downstream HTTP service (user-service, identity provider) failed
    #[error("External service {service} failed: {message}")]
    ExternalService {
        service: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Database operation error with operation context
    #[error("Database operation failed: {operation}")]
    Database {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Connection pool error
    #[error("Connection pool error")]
    ConnectionPool {
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn not_found(entity: &str, field: &str, value: impl ToString) -> Self {
        AppError::NotFound {
            entity: entity.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
        }
    }

    pub fn user_service(message: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        AppError::ExternalService {
            service: "user-service".to_string(),
            message: message.into(),
            source,
        }
    }

    pub fn missing_config(key: &str) -> Self {
        AppError::Configuration {
            key: key.to_string(),
            source: anyhow::anyhow!("required setting '{}' is not configured", key),
        }
    }

    /// Whether this error is the server's fault (and must be logged with its source chain).
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            AppError::ExternalService { .. }
                | AppError::Database { .. }
                | AppError::Configuration { .. }
                | AppError::ConnectionPool { .. }
                | AppError::Internal { .. }
        )
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(error: diesel::result::Error) -> Self {
        DatabaseErrorConverter::convert_diesel_error(error, "database operation")
    }
}

impl From<bb8::RunError<diesel_async::pooled_connection::PoolError>> for AppError {
    fn from(error: bb8::RunError<diesel_async::pooled_connection::PoolError>) -> Self {
        AppError::ConnectionPool {
            source: anyhow::Error::msg(error.to_string()),
        }
    }
}

/// Flattens nested validation errors into `parent.child` / `list[i].child` paths.
fn collect_field_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<ValidationFieldError>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.extend(errs.iter().map(|e| ValidationFieldError {
                    field: path.clone(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value ({})", e.code)),
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_field_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_field_errors(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        collect_field_errors("", &errors, &mut fields);
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::ValidationErrors { errors: fields }
    }
}

impl From<crate::config::error::ConfigError> for AppError {
    fn from(error: crate::config::error::ConfigError) -> Self {
        AppError::Configuration {
            key: "settings".to_string(),
            source: anyhow::Error::from(error),
        }
    }
}

macro_rules! impl_from_rejection {
    ($($rejection:ty),+ $(,)?) => {
        $(
            impl From<$rejection> for AppError {
                fn from(rejection: $rejection) -> Self {
                    AppError::BadRequest {
                        message: rejection.body_text(),
                    }
                }
            }
        )+
    };
}

impl_from_rejection!(
    axum::extract::rejection::JsonRejection,
    axum::extract::rejection::QueryRejection,
    axum::extract::rejection::PathRejection,
);

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;

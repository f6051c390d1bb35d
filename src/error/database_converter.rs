use crate::error::{AppError, ConstraintParser};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Maps Diesel errors onto `AppError` so that constraint violations surface
/// as 409/400 responses instead of opaque 500s.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error to an appropriate AppError variant.
    ///
    /// # Arguments
    /// * `error` - The Diesel error to convert
    /// * `operation` - Description of the database operation that failed
    ///
    /// # Returns
    /// An AppError variant appropriate for the type of database error
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info, operation)
            }
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    /// Converts a database error with detailed constraint information.
    ///
    /// # Arguments
    /// * `kind` - The type of database error
    /// * `info` - Detailed error information from the database
    /// * `operation` - Description of the database operation that failed
    ///
    /// # Returns
    /// An AppError variant with structured constraint violation information
    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: Box<dyn diesel::result::DatabaseErrorInformation + Send + Sync>,
        operation: &str,
    ) -> AppError {
        let message = info.message();
        let constraint_name = info.constraint_name();

        match kind {
            DatabaseErrorKind::UniqueViolation => {
                if let Some((entity, field, value)) =
                    ConstraintParser::parse_unique_violation(message, constraint_name)
                {
                    AppError::Duplicate {
                        entity,
                        field,
                        value,
                    }
                } else {
                    AppError::Database {
                        operation: operation.to_string(),
                        source: anyhow::Error::msg(format!(
                            "Unique constraint violation: {}",
                            message
                        )),
                    }
                }
            }
            DatabaseErrorKind::NotNullViolation => {
                if let Some((entity, field)) =
                    ConstraintParser::parse_not_null_violation(message, constraint_name)
                {
                    AppError::Validation {
                        field,
                        reason: format!("Field is required for {}", entity),
                    }
                } else {
                    AppError::Database {
                        operation: operation.to_string(),
                        source: anyhow::Error::msg(format!(
                            "Not null constraint violation: {}",
                            message
                        )),
                    }
                }
            }
            DatabaseErrorKind::ForeignKeyViolation => {
                if let Some((entity, field, referenced_value)) =
                    ConstraintParser::parse_foreign_key_violation(message, constraint_name)
                {
                    AppError::Validation {
                        field,
                        reason: format!(
                            "Referenced {} '{}' does not exist",
                            entity, referenced_value
                        ),
                    }
                } else {
                    AppError::Database {
                        operation: operation.to_string(),
                        source: anyhow::Error::msg(format!(
                            "Foreign key constraint violation: {}",
                            message
                        )),
                    }
                }
            }
            DatabaseErrorKind::CheckViolation => {
                if let Some((entity, field)) =
                    ConstraintParser::parse_check_violation(message, constraint_name)
                {
                    AppError::Validation {
                        field,
                        reason: format!("Check constraint failed for {} field", entity),
                    }
                } else {
                    AppError::Database {
                        operation: operation.to_string(),
                        source: anyhow::Error::msg(format!(
                            "Check constraint violation: {}",
                            message
                        )),
                    }
                }
            }
            _ => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::msg(format!("Database error: {}", message)),
            },
        }
    }
}

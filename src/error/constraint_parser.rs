/// Utility for pulling structured details out of PostgreSQL constraint
/// violation messages.
///
/// Postgres reports violations as e.g.
/// `duplicate key value violates unique constraint "coupons_business_id_code_key"`
/// followed by `DETAIL: Key (business_id, code)=(..., WELCOME10) already exists.`
pub struct ConstraintParser;

/// Constraint name suffixes Postgres generates for table constraints.
const CONSTRAINT_SUFFIXES: [&str; 4] = ["_key", "_fkey", "_check", "_pkey"];

impl ConstraintParser {
    /// Parses a unique violation into `(entity, field, value)`.
    pub fn parse_unique_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        let (entity, field_from_name) = constraint_name.and_then(Self::parse_constraint_name)?;
        match Self::extract_key_value_from_message(message) {
            Some((field, value)) => Some((entity, field, value)),
            None => Some((entity, field_from_name, "duplicate_value".to_string())),
        }
    }

    /// Parses a not-null violation into `(entity, field)`.
    pub fn parse_not_null_violation(
        message: &str,
        _constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        let field = Self::extract_quoted_after(message, "column \"")?;
        let entity = Self::extract_quoted_after(message, "relation \"")
            .unwrap_or_else(|| "record".to_string());
        Some((entity, field))
    }

    /// Parses a foreign key violation into `(referenced_entity, field, value)`.
    pub fn parse_foreign_key_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        let (field, value) = Self::extract_key_value_from_message(message).or_else(|| {
            let (_, field) = constraint_name.and_then(Self::parse_foreign_key_constraint_name)?;
            Some((field, "unknown".to_string()))
        })?;
        // "is not present in table \"businesses\""
        let referenced = message
            .find("in table \"")
            .and_then(|idx| Self::extract_quoted_after(&message[idx..], "table \""))
            .unwrap_or_else(|| field.trim_end_matches("_id").to_string());
        Some((referenced, field, value))
    }

    /// Parses a check violation into `(entity, field)`.
    pub fn parse_check_violation(
        _message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        constraint_name.and_then(Self::parse_constraint_name)
    }

    /// Splits a generated constraint name such as `prizes_points_required_check`
    /// into `(table, column)`. The table is assumed to be the first segment.
    pub fn parse_constraint_name(constraint: &str) -> Option<(String, String)> {
        let stem = CONSTRAINT_SUFFIXES
            .iter()
            .find_map(|suffix| constraint.strip_suffix(suffix))?;
        let (table, column) = stem.split_once('_')?;
        if table.is_empty() || column.is_empty() {
            return None;
        }
        Some((table.to_string(), column.to_string()))
    }

    /// Like [`parse_constraint_name`](Self::parse_constraint_name) but only for `_fkey` names.
    pub fn parse_foreign_key_constraint_name(constraint: &str) -> Option<(String, String)> {
        let stem = constraint.strip_suffix("_fkey")?;
        let (table, column) = stem.split_once('_')?;
        Some((table.to_string(), column.to_string()))
    }

    /// Extracts `(field, value)` from a `Key (field)=(value)` detail line.
    pub fn extract_key_value_from_message(message: &str) -> Option<(String, String)> {
        let start = message.find("Key (")? + "Key (".len();
        let rest = &message[start..];
        let close = rest.find(")=(")?;
        let field = &rest[..close];
        let value_part = &rest[close + 3..];
        let value_end = value_part.find(')')?;
        Some((field.to_string(), value_part[..value_end].to_string()))
    }

    fn extract_quoted_after(message: &str, marker: &str) -> Option<String> {
        let start = message.find(marker)? + marker.len();
        let rest = &message[start..];
        let end = rest.find('"')?;
        Some(rest[..end].to_string())
    }
}

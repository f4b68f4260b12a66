//! Error types for sqlweave

use thiserror::Error;

/// The main error type for sqlweave operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database connection or execution error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A `{:name}` placeholder in the template has no bound value
    #[error("Named parameter not found: {name}")]
    MissingParameter { name: String },

    /// The dialect cannot express the requested statement
    #[error("{operation} is not supported by the {dialect} dialect")]
    Unsupported {
        dialect: &'static str,
        operation: &'static str,
    },

    /// A model operation was invoked on a type that maps to no columns
    #[error("'{type_name}' is not a record with mappable fields")]
    NotARecord { type_name: String },

    /// Update, delete or lookup on a record without a primary key
    #[error("Primary key not found for '{type_name}'")]
    MissingPrimaryKey { type_name: String },

    /// Single-record lookup on a record with a composite primary key
    #[error("Composite primary key ({count} fields) on '{type_name}' is not supported here")]
    CompositePrimaryKey { type_name: String, count: usize },

    /// Invalid query configuration
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The executor deadline elapsed before the statement completed
    #[error("Query timed out")]
    Timeout,
}

/// Convenience Result type for sqlweave operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new missing parameter error
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Create a new unsupported operation error
    pub fn unsupported(dialect: &'static str, operation: &'static str) -> Self {
        Self::Unsupported { dialect, operation }
    }

    /// Create a new invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    pub fn not_a_record(type_name: impl Into<String>) -> Self {
        Self::NotARecord {
            type_name: type_name.into(),
        }
    }

    pub fn missing_primary_key(type_name: impl Into<String>) -> Self {
        Self::MissingPrimaryKey {
            type_name: type_name.into(),
        }
    }

    pub fn composite_primary_key(type_name: impl Into<String>, count: usize) -> Self {
        Self::CompositePrimaryKey {
            type_name: type_name.into(),
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_error() {
        let err = Error::missing_parameter("name");
        assert!(matches!(err, Error::MissingParameter { .. }));
        assert_eq!(err.to_string(), "Named parameter not found: name");
    }

    #[test]
    fn test_unsupported_error() {
        let err = Error::unsupported("sqlite", "DROP COLUMN");
        assert!(matches!(err, Error::Unsupported { dialect: "sqlite", .. }));
        assert_eq!(
            err.to_string(),
            "DROP COLUMN is not supported by the sqlite dialect"
        );
    }

    #[test]
    fn test_invalid_query_error() {
        let err = Error::invalid_query("column count mismatch");
        assert!(matches!(err, Error::InvalidQuery { .. }));
        assert_eq!(err.to_string(), "Invalid query: column count mismatch");
    }

    #[test]
    fn test_mapping_errors_are_distinct() {
        let shape = Error::not_a_record("Empty");
        let pk = Error::missing_primary_key("Log");
        assert!(matches!(shape, Error::NotARecord { .. }));
        assert!(matches!(pk, Error::MissingPrimaryKey { .. }));
        assert_eq!(pk.to_string(), "Primary key not found for 'Log'");
    }

    #[test]
    fn test_composite_primary_key_error() {
        let err = Error::composite_primary_key("Membership", 2);
        assert!(matches!(
            err,
            Error::CompositePrimaryKey { ref type_name, count: 2 } if type_name == "Membership"
        ));
        assert_eq!(
            err.to_string(),
            "Composite primary key (2 fields) on 'Membership' is not supported here"
        );
    }
}

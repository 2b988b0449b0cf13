//! Error Handling Module
//!
//! Provides structured error types for the cleansing pipeline.
//! Uses `thiserror` for ergonomic error definitions.
//!
//! # Design Principles
//! 1. All errors are typed and descriptive
//! 2. Schema problems are raised once at load, not per row
//! 3. "Nothing to do" is never an error - stages report it as a
//!    zero-change outcome instead

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Main error type for the cleansing pipeline.
///
/// A stage-local failure aborts the whole run before that stage writes
/// anything back, so no table is ever left half-filtered on disk.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// A required table file cannot be located. Fatal for the whole run:
    /// no partial cascade is attempted without a complete table set.
    #[error("Table not found: {path}")]
    MissingTable { path: String },

    /// A table lacks a column the pipeline needs.
    #[error("Missing required column '{column}' in {table}")]
    MissingColumn { table: String, column: String },

    /// A column holds a non-numeric type where numeric is required.
    #[error("Invalid data type in column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("Data validation failed: {0}")]
    Validation(String),

    /// A row references an ID absent from its filtered parent table.
    /// Should never occur when the stage order is respected; raised
    /// loudly rather than silently dropping the row.
    #[error("Referential integrity violated: {table} references missing {column} {value}")]
    IntegrityViolation {
        table: String,
        column: String,
        value: i64,
    },

    #[error("IO error: {0}")]
    Io(String),

    #[error("Polars error: {0}")]
    Polars(String),
}

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

// ============================================================================
// Error Conversion Implementations
// ============================================================================

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        PipelineError::Polars(err.to_string())
    }
}

// ============================================================================
// Error Construction Helpers
// ============================================================================

impl PipelineError {
    /// Create a missing table error.
    pub fn missing_table(path: impl Into<String>) -> Self {
        PipelineError::MissingTable { path: path.into() }
    }

    /// Create a missing column error.
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        PipelineError::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(
        column: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        PipelineError::TypeMismatch {
            column: column.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        PipelineError::Validation(message.into())
    }

    /// Create a referential integrity violation.
    pub fn integrity(table: impl Into<String>, column: impl Into<String>, value: i64) -> Self {
        PipelineError::IntegrityViolation {
            table: table.into(),
            column: column.into(),
            value,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::missing_table("Database/House.csv");
        assert_eq!(err.to_string(), "Table not found: Database/House.csv");

        let err = PipelineError::missing_column("Consumption.csv", "Value");
        assert_eq!(
            err.to_string(),
            "Missing required column 'Value' in Consumption.csv"
        );

        let err = PipelineError::type_mismatch("Value", "f64", "str");
        assert_eq!(
            err.to_string(),
            "Invalid data type in column 'Value': expected f64, got str"
        );
    }

    #[test]
    fn test_integrity_display() {
        let err = PipelineError::integrity("Appliance.csv", "HouseIDREF", 2000925);
        assert_eq!(
            err.to_string(),
            "Referential integrity violated: Appliance.csv references missing HouseIDREF 2000925"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: PipelineError = io_err.into();

        match err {
            PipelineError::Io(msg) => assert!(msg.contains("access denied")),
            _ => panic!("Expected Io error"),
        }
    }
}

//! Error types for the ORM.
//!
//! The taxonomy follows where each failure is detected: configuration
//! errors at model declaration, validation errors at instance
//! construction, lookup errors at query build, match errors at
//! `get()`, and store errors propagated unchanged from the executor.

use std::fmt;

use thiserror::Error;

/// One violated rule on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field that failed validation.
    pub field: String,
    /// Human-readable description of the violated rule.
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A per-field validation report, raised at instance construction or
/// update time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    /// The violated rules, in field-declaration order.
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Creates a report from a non-empty error list.
    #[must_use]
    pub const fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// Creates a report for a single field.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }

    /// Returns whether the given field has an error.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed: ")?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// ORM errors.
#[derive(Debug, Error)]
pub enum OrmError {
    /// The model declaration itself is unusable.
    #[error("model configuration error: {0}")]
    Config(String),

    /// One or more field values violated their constraints.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// A filter keyword named a field the model does not have.
    #[error("unknown field '{field}' on model '{model}'")]
    UnknownField {
        /// Model being queried.
        model: String,
        /// Offending field name.
        field: String,
    },

    /// A join-path segment named a field that is not a foreign key.
    #[error("field '{field}' on model '{model}' is not a relation")]
    InvalidRelation {
        /// Model the segment was resolved against.
        model: String,
        /// Offending segment.
        field: String,
    },

    /// A filter value is unusable with the requested operator.
    #[error("invalid filter on '{field}': {message}")]
    InvalidFilter {
        /// Field the filter targets.
        field: String,
        /// What was wrong with the value.
        message: String,
    },

    /// A fetched value could not be decoded into its field's kind.
    #[error("cannot decode column '{column}': {message}")]
    Decode {
        /// Qualified column name.
        column: String,
        /// Decoding failure description.
        message: String,
    },

    /// `get()` matched no rows.
    #[error("no rows match the query")]
    NoMatch,

    /// `get()` matched more than one row.
    #[error("multiple rows match the query")]
    MultipleMatches,

    /// Store error, propagated unchanged.
    #[error("database error: {0}")]
    Database(#[from] ingot_sql::SqlError),
}

/// Result type alias for ORM operations.
pub type Result<T> = std::result::Result<T, OrmError>;

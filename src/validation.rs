//! Row validity rules.
//!
//! A row is valid iff `row_id` is present and parses as an integer AND
//! `pickup_datetime` is present and parses under the fixed external format.
//! `lat`, `lon`, and `base` are descriptive in this dataset and never
//! affect the outcome.
//!
//! Validation is a pure function over the parsed record: no I/O, same
//! record in, same outcome out. Failures carry one [`ValidationError`] per
//! offending field, distinguishing a missing value from an unparsable one.

use crate::record::IngestionRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for validation operations.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Trait for types that can be validated.
pub trait Validate {
    /// Validate this instance and return a list of errors if invalid.
    fn validate(&self) -> ValidationResult;
}

/// A single validation error tied to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Human-readable error message.
    pub message: String,
}

impl ValidationError {
    pub fn field<S: Into<String>, M: Into<String>>(field: S, message: M) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl Validate for IngestionRecord {
    fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        if self.row_id.is_none() {
            let message = if self.raw_row_id().trim().is_empty() {
                "missing"
            } else {
                "not an integer"
            };
            errors.push(ValidationError::field("row_id", message));
        }

        if self.pickup_datetime.is_none() {
            let message = if self.raw_pickup_datetime().trim().is_empty() {
                "missing"
            } else {
                "not a timestamp"
            };
            errors.push(ValidationError::field("pickup_datetime", message));
        }

        // lat/lon/base are deliberately unchecked.

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

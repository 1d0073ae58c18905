//! Field validation
//!
//! A small fluent validator that collects every problem instead of stopping
//! at the first one, so users see the complete list in a single run.
//!
//! # Example
//!
//! ```rust
//! use signguard_core::validation::Validator;
//!
//! let result = Validator::new()
//!     .required("keyAlias", "upload")
//!     .required("storePassword", "")
//!     .validate();
//!
//! assert!(!result.is_valid());
//! assert_eq!(result.errors()[0].field, "storePassword");
//! ```

use crate::error::{Error, ErrorCode, Result};
use serde::{Deserialize, Serialize};

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Names of the fields that failed, in check order
    pub fn failed_fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Convert to Result type
    pub fn to_result(self, code: ErrorCode) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
            Err(Error::new(
                code,
                format!("Validation failed: {}", messages.join("; ")),
            ))
        }
    }
}

/// Fluent validator builder
pub struct Validator {
    result: ValidationResult,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self {
            result: ValidationResult::new(),
        }
    }

    /// Validate that a field is not blank
    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: "Field is required".to_string(),
                code: "REQUIRED".to_string(),
            });
        }
        self
    }

    /// Validate that an optional field is present and not blank
    pub fn present(self, field: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.required(field, v),
            None => {
                let mut this = self;
                this.result.add_error(ValidationError {
                    field: field.to_string(),
                    message: "Field is missing".to_string(),
                    code: "MISSING".to_string(),
                });
                this
            }
        }
    }

    /// Validate that a list has at least one entry and no blank entries
    pub fn non_empty_list(mut self, field: &str, values: &[String]) -> Self {
        if values.is_empty() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: "At least one entry is required".to_string(),
                code: "EMPTY_LIST".to_string(),
            });
        } else if values.iter().any(|v| v.trim().is_empty()) {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: "Entries must not be blank".to_string(),
                code: "BLANK_ENTRY".to_string(),
            });
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}

//! Parsing error types for profile extraction
//!
//! Extraction itself never fails with an error (a page without data yields
//! `None`); these errors come from building an extractor out of bad rules and
//! from the validity gate.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Required field '{field}' not found in page")]
    RequiredFieldMissing {
        field: String,
        context: Option<String>,
    },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid text pattern: {pattern} - {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Text pattern '{pattern}' has no capture group for the numeral")]
    MissingCaptureGroup { pattern: String },

    #[error("No extraction strategy configured for field '{field}'")]
    NoStrategies { field: String },
}

impl ParsingError {
    /// Create a required field missing error with context
    pub fn required_field_missing(field: &str, context: Option<&str>) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
            context: context.map(ToString::to_string),
        }
    }

    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_pattern(pattern: &str, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Configuration problems can be fixed by editing the rules; a missing field cannot
    pub const fn is_configuration_error(&self) -> bool {
        !matches!(self, Self::RequiredFieldMissing { .. })
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;

// crates/core/src/error.rs
use thiserror::Error;

/// Missing or malformed user input. Always user-correctable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn missing(field: &'static str) -> Self {
        Self::Missing { field }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending input field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field } | Self::Invalid { field, .. } => field,
        }
    }
}

/// A tracked-file glob that could not be compiled.
#[derive(Debug, Error)]
#[error("Invalid tracked-file pattern '{pattern}': {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: globset::Error,
}

impl PatternError {
    pub fn new(pattern: impl Into<String>, source: globset::Error) -> Self {
        Self {
            pattern: pattern.into(),
            source,
        }
    }
}

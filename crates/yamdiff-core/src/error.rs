//! Core error types

use thiserror::Error;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrorInfo {
    /// Path of the offending field (e.g. `document.sections[2].marker`)
    pub path: String,
    /// Human-readable reason
    pub message: String,
}

impl ValidationErrorInfo {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("YAML parse error at line {line}, column {col}: {message}")]
    Parse {
        line: usize,
        col: usize,
        message: String,
    },

    #[error("document validation failed with {} error(s)", errors.len())]
    Validation { errors: Vec<ValidationErrorInfo> },

    #[error("invalid identity rule '{rule}': {message}")]
    BadIdentityRule { rule: String, message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;

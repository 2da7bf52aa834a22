//! CLI error types with exit code handling
//!
//! Maps engine failures to the documented exit codes: 1 for parse
//! errors and general failures, 2 for validation and marker errors,
//! 64 for usage mistakes.

use miette::Diagnostic;
use thiserror::Error;
use yamdiff_core::{CoreError, ValidationErrorInfo};
use yamdiff_engine::EngineError;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("{message}")]
    #[diagnostic(code(yamdiff::cli::parse))]
    Parse { message: String },

    #[error("validation failed with {} error(s)", errors.len())]
    #[diagnostic(code(yamdiff::cli::validation))]
    Validation { errors: Vec<ValidationErrorInfo> },

    #[error("duplicate marker '{marker}' among children of '{parent_path}'")]
    #[diagnostic(code(yamdiff::cli::duplicate_marker))]
    DuplicateMarker { parent_path: String, marker: String },

    #[error("{message}")]
    #[diagnostic(code(yamdiff::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("IO error: {message}")]
    #[diagnostic(code(yamdiff::cli::io))]
    Io { message: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Parse { .. } => exit_codes::ERROR,
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::DuplicateMarker { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Io { .. } => exit_codes::ERROR,
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: None,
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Core(core) => core.into(),
            EngineError::DuplicateMarker {
                parent_path,
                marker,
            } => CliError::DuplicateMarker {
                parent_path,
                marker,
            },
            EngineError::UnsupportedStyle { style } => CliError::Usage {
                message: format!("unsupported format style '{style}'"),
                help: Some("expected json, text, or yaml".to_string()),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Parse { .. } => CliError::Parse {
                message: err.to_string(),
            },
            CoreError::Validation { errors } => CliError::Validation { errors },
            CoreError::BadIdentityRule { .. } => CliError::Usage {
                message: err.to_string(),
                help: Some("expected ARRAY:FIELD or ARRAY:FIELD:WHEN_FIELD=WHEN_VALUE".to_string()),
            },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

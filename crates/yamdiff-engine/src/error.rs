//! Engine error types

use thiserror::Error;
use yamdiff_core::CoreError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("duplicate marker '{marker}' among children of '{parent_path}'")]
    DuplicateMarker { parent_path: String, marker: String },

    #[error("unsupported format style '{style}' (expected json, text, or yaml)")]
    UnsupportedStyle { style: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;

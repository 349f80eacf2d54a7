//! Error types for dispatch-lookup

use std::path::PathBuf;

use dispatch_core::{RecordError, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Invalid assertion list {path}: {reason}")]
    AssertionList { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

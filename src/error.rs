// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot {path}: {message}")]
    MalformedSnapshot { path: PathBuf, message: String },

    #[error("snapshot {path}: missing dataset '{name}'")]
    MissingDataset { path: PathBuf, name: String },

    #[error("timing log {path}: {message}")]
    MalformedTimingLog { path: PathBuf, message: String },

    #[error("timing log has no column named '{name}'")]
    MissingColumn { name: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary state file error: {0}")]
    Bincode(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

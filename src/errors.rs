// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown task: {0}")]
    UnknownTask(String),

    #[error("cycle detected in task graph involving '{0}'")]
    CyclicTask(String),

    #[error("injection marker '{marker}' not found in {file:?}")]
    Injection { file: PathBuf, marker: String },

    #[error("failed to clean {path:?}: {source}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;

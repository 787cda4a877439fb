//! Error types for fragment loading, export and configuration

use thiserror::Error;

/// Result type for fallible operations around the resolver
pub type Result<T> = std::result::Result<T, RefsError>;

/// Errors raised outside the (total) cache and resolver core
#[derive(Error, Debug)]
pub enum RefsError {
    #[error("Unknown type referenced: {0}")]
    UnknownType(String),

    #[error("Maximum schema depth {limit} exceeded while building {type_name}")]
    DepthExceeded { type_name: String, limit: usize },

    #[error("Invalid schema fragment at {path}: {reason}")]
    InvalidFragment { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

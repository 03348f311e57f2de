//! Error types for be-quiet.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for be-quiet operations.
#[derive(Error, Debug)]
pub enum BeQuietError {
    /// Format string and arguments did not agree.
    #[error("format error: {0}")]
    Format(String),

    /// Called a function name with no definition.
    #[error("void function: {0}")]
    VoidFunction(String),

    /// Module file could not be loaded.
    #[error("cannot open load file: {}", .0.display())]
    LoadFailed(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Convenience Result type for be-quiet operations.
pub type Result<T> = std::result::Result<T, BeQuietError>;

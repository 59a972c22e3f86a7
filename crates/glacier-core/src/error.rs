//! Error types module
//!
//! Errors raised by the core domain: registry lookups, credential checks and
//! the properties directory.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{what} index {index} is out of range (0..{len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cannot create directory '{}' for properties and logs", path.display())]
    PropertiesDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unable to resolve the home directory")]
    HomeDirUnavailable,

    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition {
        from: crate::models::JobState,
        to: crate::models::JobState,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

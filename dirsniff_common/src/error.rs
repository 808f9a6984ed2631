use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SniffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Root does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Invalid ignore pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Not a UTF-8 text file: {}", .0.display())]
    NotText(PathBuf),

    #[error("No such entry in comparison result: {0}")]
    UnknownEntry(String),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
}

impl SniffError {
    /// True for the errors raised before any traversal starts because a
    /// root is missing or not a directory.
    pub fn is_precondition(&self) -> bool {
        matches!(self, SniffError::RootNotFound(_) | SniffError::NotADirectory(_))
    }
}

pub type Result<T> = std::result::Result<T, SniffError>;

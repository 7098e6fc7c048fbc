//! Error types for fragcheck
//!
//! Provides a unified error type for the fragment pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fragcheck core operations
pub type Result<T> = std::result::Result<T, FragError>;

/// Unified error type for the fragment pipeline
#[derive(Error, Debug)]
pub enum FragError {
    // ===== Fragment Errors =====
    #[error("Invalid fragment size: {0} (must be greater than zero)")]
    InvalidFragmentSize(u64),

    #[error("Failed to merge fragment {index} ({}): {source}", .path.display())]
    Merge {
        index: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ===== Handle Errors =====
    #[error("Invalid content handle: {0}")]
    InvalidHandle(String),

    // ===== Work Directory Errors =====
    #[error("Work directory is not empty: {}", .0.display())]
    WorkDirNotEmpty(PathBuf),

    // ===== I/O Errors =====
    #[error("I/O error on {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FragError {
    /// Wrap an I/O error with the path it happened on
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FragError::File {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FragError::InvalidFragmentSize(0);
        assert_eq!(
            err.to_string(),
            "Invalid fragment size: 0 (must be greater than zero)"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FragError = io_err.into();
        assert!(matches!(err, FragError::Io(_)));
    }

    #[test]
    fn test_file_error_names_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = FragError::file("/tmp/part_3.bin", io_err);
        assert!(err.to_string().contains("part_3.bin"));
    }
}

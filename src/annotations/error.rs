//! Annotation error types

use thiserror::Error;

/// Result type for annotation operations
pub type Result<T> = std::result::Result<T, AnnotationError>;

/// Errors raised by the annotation store, lifecycle and service
#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Annotation not found: {0}")]
    NotFound(String),

    #[error("Invalid vote: {0}")]
    InvalidVote(String),

    #[error("Invalid moderation action: {0}")]
    InvalidAction(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for AnnotationError {
    fn from(e: sqlx::Error) -> Self {
        AnnotationError::Storage(e.to_string())
    }
}

impl From<std::io::Error> for AnnotationError {
    fn from(e: std::io::Error) -> Self {
        AnnotationError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for AnnotationError {
    fn from(e: serde_json::Error) -> Self {
        AnnotationError::Storage(e.to_string())
    }
}


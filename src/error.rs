//! Error types for the Elpriser server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::annotations::AnnotationError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Annotation(#[from] AnnotationError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            AppError::Annotation(e) => match e {
                AnnotationError::Validation(msg) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "validation_error",
                    msg.clone(),
                ),
                AnnotationError::NotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "not_found",
                    format!("Annotation '{}' not found", id),
                ),
                AnnotationError::InvalidVote(vote) => (
                    StatusCode::BAD_REQUEST,
                    "invalid_vote",
                    format!("Unknown vote '{}', expected like or dislike", vote),
                ),
                AnnotationError::InvalidAction(action) => (
                    StatusCode::BAD_REQUEST,
                    "invalid_action",
                    format!("Unknown action '{}', expected remove, warn or restore", action),
                ),
                AnnotationError::Storage(msg) => {
                    tracing::error!("Storage error: {}", msg);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "storage_error",
                        "Storage error".to_string(),
                    )
                }
            },
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AnnotationError::Validation("text is required".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AnnotationError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AnnotationError::InvalidVote("bogus".into()), StatusCode::BAD_REQUEST),
            (AnnotationError::InvalidAction("delete".into()), StatusCode::BAD_REQUEST),
            (AnnotationError::Storage("disk full".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(AppError::from(error).into_response().status(), status);
        }
        assert_eq!(
            AppError::Forbidden("no".into()).into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}

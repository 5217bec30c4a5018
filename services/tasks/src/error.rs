//! Error types for the tasks service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failure of a task operation
#[derive(Error, Debug)]
pub enum TaskError {
    /// Target task or referenced user does not exist
    #[error("{entity} not found with id: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Caller's role or ownership does not permit the operation
    #[error("{0}")]
    AuthorizationDenied(String),

    /// Missing or blank payload
    #[error("{0}")]
    InvalidArgument(String),

    /// The task changed since it was loaded
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl TaskError {
    pub fn task_not_found(id: i64) -> Self {
        TaskError::NotFound { entity: "Task", id }
    }

    pub fn user_not_found(id: i64) -> Self {
        TaskError::NotFound { entity: "User", id }
    }
}

pub type TaskResult<T> = Result<T, TaskError>;

/// HTTP-facing error of the tasks service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid access token
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            TaskError::AuthorizationDenied(msg) => ApiError::Forbidden(msg),
            TaskError::InvalidArgument(msg) => ApiError::BadRequest(msg),
            TaskError::Conflict(msg) => ApiError::Conflict(msg),
            TaskError::Database(e) => {
                error!("Task storage failure: {}", e);
                ApiError::InternalServerError
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity_and_id() {
        assert_eq!(
            TaskError::task_not_found(9).to_string(),
            "Task not found with id: 9"
        );
        assert_eq!(
            TaskError::user_not_found(3).to_string(),
            "User not found with id: 3"
        );
    }

    #[test]
    fn task_errors_map_to_distinct_statuses() {
        let cases = [
            (TaskError::task_not_found(1), StatusCode::NOT_FOUND),
            (
                TaskError::AuthorizationDenied("no".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (
                TaskError::InvalidArgument("blank".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                TaskError::Conflict("stale".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                TaskError::Database(DatabaseError::Decode("x".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}

//! Error types for the authentication service

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::accounts::AccountError;

/// HTTP-facing error of the authentication service
#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing, invalid, revoked or mismatched token
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    /// Login attempts exhausted for this username
    #[error("Too many login attempts, retry in {retry_after} seconds")]
    TooManyRequests { retry_after: u64 },

    #[error("Internal server error")]
    InternalServerError,
}

impl From<AccountError> for AuthError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Conflict(_) => AuthError::Conflict(err.to_string()),
            AccountError::InvalidArgument(msg) => AuthError::BadRequest(msg),
            AccountError::InvalidCredentials => AuthError::InvalidCredentials,
            AccountError::Hashing(_) | AccountError::Database(_) => {
                error!("Account operation failed: {}", err);
                AuthError::InternalServerError
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::Unauthorized | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AuthError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        let mut response = (status, body).into_response();
        if let AuthError::TooManyRequests { retry_after } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        }
        response
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

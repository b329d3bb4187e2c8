use crate::domain::errors::{AiError, DatabaseError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    Forbidden(String),
    Conflict(String),
    TooManyRequests(String),
    Internal(String),
    Database(DatabaseError),
    Ai(AiError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::TooManyRequests(msg) => write!(f, "Too many requests: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Database(err) => write!(f, "Database error: {}", err),
            ApiError::Ai(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Database(err) => Some(err),
            ApiError::Ai(err) => Some(err),
            _ => None,
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Database(err) if err.is_unique_violation() => StatusCode::CONFLICT,
            ApiError::Internal(_) | ApiError::Database(_) | ApiError::Ai(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text safe to show to the caller; store and provider details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Conflict(msg)
            | ApiError::TooManyRequests(msg)
            | ApiError::Internal(msg) => msg.clone(),
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::Database(err) if err.is_unique_violation() => {
                "Resource already exists".to_string()
            }
            ApiError::Database(err) => format!("Database error during {}", err.operation),
            ApiError::Ai(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ApiError::Database(err) => {
                tracing::error!(operation = err.operation, error = %err.message, "database call failed");
            }
            ApiError::Ai(AiError::InvalidResponse(detail)) => {
                tracing::warn!(detail = %detail, "AI model output rejected by decoder");
            }
            ApiError::Ai(err) => tracing::warn!(error = %err, "AI chain failed"),
            ApiError::Internal(msg) => tracing::error!("internal error: {}", msg),
            _ => {}
        }

        let body = Json(json!({
            "error": self.public_message()
        }));

        (status, body).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Database(err)
    }
}

impl From<AiError> for ApiError {
    fn from(err: AiError) -> Self {
        ApiError::Ai(err)
    }
}

// Convert from argon2 errors
impl From<argon2::password_hash::Error> for ApiError {
    fn from(_: argon2::password_hash::Error) -> Self {
        ApiError::Internal("Password hashing error".to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

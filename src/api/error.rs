use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AuthError, Denial, PasteError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ValidationError(String),

    Conflict(String),

    InternalError(String),

    Unauthorized(String),

    Forbidden(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthorized("Invalid credentials".into()),
            AuthError::UsernameTaken => ApiError::Conflict("Username already taken".into()),
            AuthError::UserNotFound => ApiError::NotFound("User not found".into()),
            AuthError::Validation(msg) => ApiError::ValidationError(msg),
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<PasteError> for ApiError {
    fn from(err: PasteError) -> Self {
        match err {
            PasteError::NotFound | PasteError::Expired | PasteError::Burned => {
                ApiError::NotFound(err.to_string())
            }
            PasteError::Denied(Denial::NotAuthenticated) => {
                ApiError::Unauthorized(Denial::NotAuthenticated.to_string())
            }
            PasteError::Denied(denial) => ApiError::Forbidden(denial.to_string()),
            PasteError::Validation(msg) => ApiError::ValidationError(msg),
            PasteError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_paste_errors_map_to_statuses() {
        assert_eq!(status_of(PasteError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(PasteError::Expired), StatusCode::NOT_FOUND);
        assert_eq!(status_of(PasteError::Burned), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(PasteError::Denied(Denial::Private)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(PasteError::Denied(Denial::NotOwner)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(PasteError::Denied(Denial::NotAuthenticated)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(PasteError::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(PasteError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_errors_map_to_statuses() {
        assert_eq!(status_of(AuthError::UsernameTaken), StatusCode::CONFLICT);
        assert_eq!(
            status_of(AuthError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(AuthError::UserNotFound), StatusCode::NOT_FOUND);
    }
}

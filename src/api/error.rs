use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::collections::BTreeMap;
use std::fmt;

use super::ApiResponse;
use crate::services::{AuthError, ProfileError, ReportError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError(String),

    /// Per-field messages, reported together before any mutation.
    FieldErrors(BTreeMap<String, String>),

    Unauthorized(String),

    Forbidden(String),

    Conflict(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::FieldErrors(errors) => write!(f, "Validation failed for {} field(s)", errors.len()),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, ApiResponse::<()>::error(msg)),
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, ApiResponse::<()>::error(msg)),
            Self::FieldErrors(errors) => (
                StatusCode::BAD_REQUEST,
                ApiResponse::<()>::field_errors(errors),
            ),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ApiResponse::<()>::error(msg)),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, ApiResponse::<()>::error(msg)),
            Self::Conflict(msg) => (StatusCode::CONFLICT, ApiResponse::<()>::error(msg)),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::error("A database error occurred"),
                )
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::error(format!("An internal error occurred: {msg}")),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                Self::Unauthorized("Invalid username or password".to_string())
            }
            AuthError::AccountNotFound => Self::NotFound("Account not found".to_string()),
            AuthError::Fields(errors) => Self::FieldErrors(errors),
            AuthError::Validation(msg) => Self::ValidationError(msg),
            AuthError::Unauthenticated => Self::Unauthorized("Not authenticated".to_string()),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound => Self::NotFound("Alumni profile not found".to_string()),
            ProfileError::Conflict(msg) => Self::Conflict(msg),
            ProfileError::Fields(errors) => Self::FieldErrors(errors),
            ProfileError::Database(msg) => Self::DatabaseError(msg),
            ProfileError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::NotFound(id) => Self::NotFound(format!("Report {id} not found")),
            ReportError::Database(msg) => Self::DatabaseError(msg),
            ReportError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{resource} {id} not found"))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    #[must_use]
    pub fn field(name: &str, message: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(name.to_string(), message.to_string());
        Self::FieldErrors(errors)
    }
}

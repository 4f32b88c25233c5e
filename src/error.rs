use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tokio_postgres::error::SqlState;

use crate::models::thought::{FieldErrorKind, ValidationErrors, MESSAGE_MAX_LENGTH, MESSAGE_MIN_LENGTH};

/// Message returned to callers for any store failure
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// Fold store failures into the `{success: false, error}` envelope used by
    /// the like route. Detail is logged and replaced with `message`.
    pub fn into_rejection(self, message: &str) -> Self {
        match self {
            ApiError::Database(ref err) => {
                tracing::error!("Store error rejected as bad request: {}", err);
                ApiError::Rejected(message.to_string())
            }
            ApiError::Internal(ref err) => {
                tracing::error!("Internal error rejected as bad request: {}", err);
                ApiError::Rejected(message.to_string())
            }
            other => other,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Database(ref err) => {
                if err.contains("connection") || err.contains("unavailable") {
                    tracing::error!("PostgreSQL connection issue: {}", err);
                } else {
                    tracing::error!("PostgreSQL database error: {}", err);
                }

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": SERVER_ERROR_MESSAGE })),
                )
                    .into_response()
            }
            ApiError::Validation(errors) => {
                tracing::debug!("Validation failed: {}", errors);
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Could not save thought",
                        "errors": errors,
                    })),
                )
                    .into_response()
            }
            ApiError::NotFound(message) => {
                tracing::debug!("Resource not found: {}", message);
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "success": false, "message": message })),
                )
                    .into_response()
            }
            ApiError::Rejected(error) => {
                tracing::debug!("Request rejected: {}", error);
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "success": false, "error": error })),
                )
                    .into_response()
            }
            ApiError::Internal(ref err) => {
                tracing::error!("Internal server error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": SERVER_ERROR_MESSAGE })),
                )
                    .into_response()
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

// PostgreSQL error mapping
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.code() {
            Some(&SqlState::CHECK_VIOLATION) | Some(&SqlState::STRING_DATA_LENGTH_MISMATCH) => {
                ApiError::Validation(ValidationErrors::single(
                    "message",
                    FieldErrorKind::Invalid,
                    format!(
                        "Path `message` must be between {} and {} characters.",
                        MESSAGE_MIN_LENGTH, MESSAGE_MAX_LENGTH
                    ),
                    None,
                ))
            }
            Some(&SqlState::CHARACTER_NOT_IN_REPERTOIRE) | Some(&SqlState::UNTRANSLATABLE_CHARACTER) => {
                ApiError::Validation(ValidationErrors::single(
                    "message",
                    FieldErrorKind::Invalid,
                    "Path `message` contains characters the store cannot hold.",
                    None,
                ))
            }
            Some(&SqlState::NOT_NULL_VIOLATION) => ApiError::Validation(ValidationErrors::single(
                "message",
                FieldErrorKind::Required,
                "Path `message` is required.",
                None,
            )),
            Some(&SqlState::CONNECTION_EXCEPTION)
            | Some(&SqlState::CONNECTION_DOES_NOT_EXIST)
            | Some(&SqlState::CONNECTION_FAILURE) => {
                tracing::error!("PostgreSQL connection error: {}", err);
                ApiError::Database("Database connection unavailable".to_string())
            }
            _ => {
                tracing::error!("Unhandled PostgreSQL error: {} (code: {:?})", err, err.code());
                ApiError::Database("Database operation failed".to_string())
            }
        }
    }
}

// Connection pool error mapping
impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        match err {
            deadpool_postgres::PoolError::Timeout(_) => {
                tracing::warn!("Database connection pool timeout: {}", err);
                ApiError::Database("Database connection timeout".to_string())
            }
            deadpool_postgres::PoolError::Closed => {
                tracing::error!("Database connection pool is closed: {}", err);
                ApiError::Database("Database service unavailable".to_string())
            }
            deadpool_postgres::PoolError::NoRuntimeSpecified => {
                tracing::error!("Database pool runtime error: {}", err);
                ApiError::Internal(anyhow::anyhow!("Database configuration error"))
            }
            _ => {
                tracing::error!("Database connection pool error: {}", err);
                ApiError::Database("Database connection unavailable".to_string())
            }
        }
    }
}

// Result type alias for convenience
pub type ApiResult<T> = Result<T, ApiError>;

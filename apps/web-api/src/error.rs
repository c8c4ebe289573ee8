//! Error types for the HTTP API.
//!
//! Every failure leaves a handler as an [`ApiError`] and is rendered as
//! `{ "code": ..., "message": ... }` with the status of its class:
//!
//! ```text
//! Validation   400   malformed or out-of-range input
//! Unauthorized 401   missing/invalid session, bad credentials, blocked account
//! Forbidden    403   role not allowed for the operation
//! NotFound     404   missing OR outside the caller's scope
//! Conflict     409   duplicate handle, stock, delete guard, credit state
//! Store        500   persistence failure (details only in the log)
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shopbook_core::{AccessError, CoreError, ValidationError};
use shopbook_db::DbError;
use tracing::error;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error")]
    Store,
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Store => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Store => "store_error",
        }
    }

    pub fn not_found(entity: &str) -> Self {
        ApiError::NotFound(entity.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<AccessError> for ApiError {
    fn from(error: AccessError) -> Self {
        match error {
            AccessError::Forbidden => ApiError::Forbidden(error.to_string()),
            AccessError::InvalidCredentials
            | AccessError::AccountBlocked
            | AccessError::Unauthenticated => ApiError::Unauthorized(error.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(e) => ApiError::Validation(e.to_string()),
            CoreError::ProductNotFound(_) => ApiError::not_found("product"),
            CoreError::CreditNotFound(_) => ApiError::not_found("credit"),
            CoreError::InsufficientStock { .. }
            | CoreError::CreditCompleted(_)
            | CoreError::Overpayment { .. }
            | CoreError::AccountInUse { .. } => ApiError::Conflict(error.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::Validation(error.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::Domain(e) => e.into(),
            DbError::NotFound { entity, .. } => ApiError::NotFound(entity.to_lowercase()),
            DbError::UniqueViolation { field, value } => {
                ApiError::Conflict(format!("{} '{}' is already taken", field, value))
            }
            other => {
                error!(error = %other, "Database operation failed");
                ApiError::Store
            }
        }
    }
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shopbook_core::Money;

    #[test]
    fn test_status_per_class() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (
                CoreError::from(ValidationError::Required {
                    field: "name".to_string(),
                })
                .into(),
                StatusCode::BAD_REQUEST,
            ),
            (AccessError::InvalidCredentials.into(), StatusCode::UNAUTHORIZED),
            (AccessError::Forbidden.into(), StatusCode::FORBIDDEN),
            (
                CoreError::ProductNotFound("p".to_string()).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                CoreError::Overpayment {
                    remaining: Money::from_cents(100),
                    requested: Money::from_cents(200),
                }
                .into(),
                StatusCode::CONFLICT,
            ),
            (
                DbError::duplicate("handle", "maria").into(),
                StatusCode::CONFLICT,
            ),
            (
                DbError::QueryFailed("disk I/O error".to_string()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.status(), status, "{:?}", error);
        }
    }

    #[test]
    fn test_store_errors_hide_details() {
        let error: ApiError = DbError::QueryFailed("no such table: credits".to_string()).into();
        assert_eq!(error.to_string(), "internal error");
    }

    #[test]
    fn test_credential_message_is_unified() {
        let error: ApiError = AccessError::InvalidCredentials.into();
        assert_eq!(error.to_string(), "invalid handle or password");
    }
}

//! API Error Types
//!
//! Maps domain errors to HTTP status codes and a JSON error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::service::ServiceError;
use crate::store::{RangeError, StoreError};
use crate::time::InstantError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed request input
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Store(e) => ApiError::Store(e),
            ServiceError::Auth(e) => ApiError::Auth(e),
        }
    }
}

impl From<RangeError> for ApiError {
    fn from(err: RangeError) -> Self {
        ApiError::Store(err.into())
    }
}

impl From<InstantError> for ApiError {
    fn from(err: InstantError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Store(e) => match e {
                StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                StoreError::SeriesNotFound(_) => (StatusCode::NOT_FOUND, "SERIES_NOT_FOUND"),
                StoreError::DuplicateName(_) => (StatusCode::CONFLICT, "DUPLICATE_NAME"),
                StoreError::EmptyName => (StatusCode::BAD_REQUEST, "EMPTY_NAME"),
                StoreError::InvalidRange { .. } => (StatusCode::BAD_REQUEST, "INVALID_RANGE"),
                StoreError::OutOfRange { .. } => (StatusCode::BAD_REQUEST, "OUT_OF_RANGE"),
                StoreError::NotANumber { .. } => (StatusCode::BAD_REQUEST, "NOT_A_NUMBER"),
                StoreError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            },
            ApiError::Auth(e) => match e {
                AuthError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS")
                }
                AuthError::Unauthorized => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
                AuthError::PasswordMismatch => (StatusCode::BAD_REQUEST, "PASSWORD_MISMATCH"),
                AuthError::PasswordTooShort { .. } => {
                    (StatusCode::BAD_REQUEST, "PASSWORD_TOO_SHORT")
                }
                AuthError::PasswordUnchanged => (StatusCode::BAD_REQUEST, "PASSWORD_UNCHANGED"),
                AuthError::UsernameTaken(_) => (StatusCode::CONFLICT, "USERNAME_TAKEN"),
                AuthError::EmptyUsername => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                AuthError::GuestDisabled | AuthError::RegistrationDisabled => {
                    (StatusCode::FORBIDDEN, "DISABLED")
                }
                AuthError::Hashing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
                AuthError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            },
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{SeriesId, StorageError};
    use crate::store::Entity;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (
                StoreError::not_found(Entity::Series, SeriesId(1)).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                StoreError::DuplicateName("Temp".into()).into(),
                StatusCode::CONFLICT,
            ),
            (
                StoreError::OutOfRange {
                    value: 60.0,
                    min: -20.0,
                    max: 50.0,
                }
                .into(),
                StatusCode::BAD_REQUEST,
            ),
            (AuthError::Unauthenticated.into(), StatusCode::UNAUTHORIZED),
            (AuthError::Unauthorized.into(), StatusCode::FORBIDDEN),
            (
                AuthError::PasswordTooShort { min: 6 }.into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                StoreError::Storage(StorageError::Lock("poisoned".into())).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_and_code().0, status, "{}", err);
        }
    }

    #[test]
    fn test_out_of_range_message_echoes_bounds() {
        let err: ApiError = StoreError::OutOfRange {
            value: 60.0,
            min: -20.0,
            max: 50.0,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Value 60 is outside the allowed range (-20 - 50) for this series."
        );
    }
}

//! Error types for the Store API.
//!
//! ## Mapping
//! ```text
//! CoreError / DbError / ValidationError
//!        │
//!        ▼
//! ApiError (this module)
//!        │
//!        ▼
//! HTTP status + JSON body { "error": "...", "reason": "..."? }
//! ```
//!
//! Purchase conflicts surface as 409 "You already own this book"; download
//! denials carry their specific reason code so the frontend can route the
//! user to the right remediation. Internal details are logged, never leaked.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use vault_core::{CoreError, ValidationError};
use vault_db::DbError;

/// Store API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Download denied by the entitlement check.
    /// Carries the wire-level reason code (NOT_PURCHASED, NO_DEVICE, ...).
    #[error("Forbidden: {message}")]
    Forbidden {
        message: String,
        reason_code: &'static str,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Shorthand for 401 responses.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::AuthFailed(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": msg }),
            ),
            ApiError::AuthFailed(msg) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": msg }),
            ),
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "error": msg }),
            ),
            ApiError::Conflict(msg) => (
                StatusCode::CONFLICT,
                json!({ "error": msg }),
            ),
            ApiError::Forbidden { message, reason_code } => (
                StatusCode::FORBIDDEN,
                json!({ "error": message, "reason": reason_code }),
            ),
            ApiError::Internal(msg) => {
                // Log the detail, return a generic message
                error!(detail = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UserNotFound(_) | CoreError::BookNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            CoreError::BookUnavailable(_) => ApiError::NotFound(err.to_string()),
            CoreError::AlreadyOwned { .. } => {
                ApiError::Conflict("You already own this book".to_string())
            }
            CoreError::DownloadNotPermitted { reason } => ApiError::Forbidden {
                message: reason.to_string(),
                reason_code: reason.code(),
            },
            CoreError::NoDeviceRegistered => {
                ApiError::Validation("No device is currently registered".to_string())
            }
            CoreError::InvalidStatusTransition { .. } => ApiError::Conflict(err.to_string()),
            CoreError::Validation(v) => v.into(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            // Unique violations are translated to domain conflicts at the
            // call sites that know which constraint fired (email vs.
            // completed purchase); any that reach here keep the generic form.
            DbError::UniqueViolation { .. } => ApiError::Conflict(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_core::entitlement::DenialReason;

    #[test]
    fn test_already_owned_maps_to_conflict_message() {
        let api: ApiError = CoreError::AlreadyOwned {
            book_id: "b-1".to_string(),
        }
        .into();
        match api {
            ApiError::Conflict(msg) => assert_eq!(msg, "You already own this book"),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_denial_reason_code_travels() {
        let api: ApiError = CoreError::DownloadNotPermitted {
            reason: DenialReason::NoDevice,
        }
        .into();
        match api {
            ApiError::Forbidden { reason_code, .. } => assert_eq!(reason_code, "NO_DEVICE"),
            other => panic!("expected forbidden, got {:?}", other),
        }
    }
}

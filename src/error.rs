//! Request-boundary error type and its Axum integration.
//!
//! Every handler-level failure is mapped here into exactly one HTTP
//! response; nothing propagates past the request boundary. Internal causes
//! are logged server-side and never leaked to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::auth::service::AuthError;
use crate::database::StoreError;

/// Field-level validation failure, surfaced in 400 bodies as
/// `{ "field": ..., "message": ... }`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Application error taxonomy mapped to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            ApiError::Validation(errors) => json!({ "errors": errors }),
            // Always the same generic message; the caller never learns
            // whether the token was missing, malformed, or expired.
            ApiError::Unauthorized => json!({ "message": "Unauthorized" }),
            ApiError::NotFound(what) => json!({ "message": format!("{what} not found") }),
            ApiError::Conflict(message) => json!({ "message": message }),
            ApiError::Internal(cause) => {
                tracing::error!("internal error: {cause:#}");
                json!({ "message": "Internal server error" })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(errors) => ApiError::Validation(errors),
            AuthError::UsernameTaken => {
                ApiError::Conflict("Username is already taken".to_string())
            }
            AuthError::BadCredential => ApiError::Unauthorized,
            AuthError::Store(cause) => ApiError::Internal(cause),
            AuthError::Hash(cause) => ApiError::Internal(cause),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => ApiError::Conflict("Duplicate record".to_string()),
            StoreError::Backend(cause) => ApiError::Internal(cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            ApiError::Validation(vec![]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("Car").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Conflict("taken".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bad_credential_collapses_to_unauthorized() {
        // Unknown user and wrong password must be indistinguishable to the
        // client.
        let err: ApiError = AuthError::BadCredential.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn duplicate_username_maps_to_conflict() {
        let err: ApiError = AuthError::UsernameTaken.into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn field_error_serializes_field_and_message() {
        let err = FieldError::new("year", "Year is required");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["field"], "year");
        assert_eq!(value["message"], "Year is required");
    }
}

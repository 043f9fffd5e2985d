//! API error handling
//!
//! Every failure leaves the API as a single `{"error": "<message>"}` body.
//! Store and transaction failures are logged in full and reported opaquely.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use core_kernel::PortError;
use domain_claims::ClaimError;
use domain_warranty::WarrantyError;

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(detail) => {
                error!(detail = %detail, "request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            PortError::Validation { message, .. } => ApiError::BadRequest(message),
            PortError::Conflict { message } => ApiError::Conflict(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<WarrantyError> for ApiError {
    fn from(err: WarrantyError) -> Self {
        match err {
            WarrantyError::Validation(msg) => ApiError::BadRequest(msg),
            WarrantyError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            WarrantyError::InvalidCredentials | WarrantyError::AccountDisabled => {
                ApiError::Unauthorized(err.to_string())
            }
            WarrantyError::PasswordHash(msg) => ApiError::Internal(msg),
            WarrantyError::Port(port) => port.into(),
        }
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::Validation(msg) => ApiError::BadRequest(msg),
            ClaimError::ForeignWarrantyPart { .. } => ApiError::Validation(err.to_string()),
            ClaimError::Warranty(warranty) => warranty.into(),
            ClaimError::Port(port) => port.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden(msg) => ApiError::Forbidden(msg),
            AuthError::Signing(msg) => ApiError::Internal(msg),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let field_errors = err.field_errors();
        let mut fields: Vec<&str> = field_errors.keys().map(|k| k.as_ref()).collect();
        fields.sort_unstable();
        ApiError::Validation(format!("invalid fields: {}", fields.join(", ")))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_errors_map_to_status() {
        assert_eq!(
            ApiError::from(PortError::not_found("Warranty", 3)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(PortError::conflict("duplicate")).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(PortError::validation("bad")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(PortError::connection("refused")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_nested_domain_errors_unwrap() {
        let err = ClaimError::Warranty(WarrantyError::Port(PortError::not_found("Warranty", 9)));
        assert_eq!(ApiError::from(err).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(WarrantyError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
    }
}

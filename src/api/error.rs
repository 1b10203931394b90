//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::portal::PortalError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Authentication failed: {0}")]
    AuthFailed(String),
    #[error("Role mismatch: {0}")]
    RoleMismatch(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::Validation(detail) => (StatusCode::BAD_REQUEST, "VALIDATION", detail),
            ApiError::AuthFailed(detail) => {
                tracing::warn!(detail = %detail, "Sign-in rejected");
                (StatusCode::UNAUTHORIZED, "AUTH_FAILED", detail)
            }
            ApiError::RoleMismatch(detail) => (StatusCode::FORBIDDEN, "ROLE_MISMATCH", detail),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, "FORBIDDEN", detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail),
            ApiError::Upstream(detail) => {
                tracing::warn!(detail = %detail, "Backend call failed");
                (StatusCode::BAD_GATEWAY, "UPSTREAM", detail)
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<PortalError> for ApiError {
    fn from(err: PortalError) -> Self {
        let message = err.to_string();
        match err {
            PortalError::Validation(_) => ApiError::Validation(message),
            PortalError::NotFound(_) => ApiError::NotFound(message),
            PortalError::RoleMismatch { .. } => ApiError::RoleMismatch(message),
            PortalError::WrongRole { .. } => ApiError::Forbidden(message),
            PortalError::CredentialsRejected(_) => ApiError::AuthFailed(message),
            PortalError::Conflict(_) => ApiError::Conflict(message),
            PortalError::Upstream(_) => ApiError::Upstream(message),
            PortalError::Internal(_) => ApiError::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use axum::body::to_bytes;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn unauthorized_returns_401() {
        let (status, json) = body_of(ApiError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn validation_keeps_message() {
        let err: ApiError = PortalError::Validation("Passwords do not match").into();
        let (status, json) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION");
        assert_eq!(json["error"]["message"], "Passwords do not match");
    }

    #[tokio::test]
    async fn role_mismatch_names_stored_role() {
        let err: ApiError = PortalError::RoleMismatch { stored: Role::Patient }.into();
        let (status, json) = body_of(err).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            json["error"]["message"],
            "This account is registered as a patient. Please select the correct role."
        );
    }

    #[tokio::test]
    async fn upstream_surfaces_provider_message() {
        let err: ApiError = PortalError::Upstream("Network error: connection refused".into()).into();
        let (status, json) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"]["message"], "Network error: connection refused");
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let (status, json) = body_of(ApiError::Internal("lock poisoned".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }
}

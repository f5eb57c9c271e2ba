//! Unified API error handling with structured responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::catalog::CatalogError;
use crate::gcp::ProjectError;
use crate::registry::RegistryError;

/// API error type with structured responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A 4xx from Google that has no dedicated variant (409, 429, ...).
    #[error("Upstream rejected request: {1}")]
    Upstream(StatusCode, String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Gateway error: {0}")]
    BadGateway(String),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self::BadGateway(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Upstream(status, _) => *status,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Upstream(..) => "UPSTREAM_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::BadGateway(_) => "BAD_GATEWAY",
        }
    }
}

/// Structured error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub status_code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();

        match &self {
            ApiError::Internal(msg) | ApiError::BadGateway(msg) => {
                error!(error_code = code, message = %msg, "API error");
            }
            ApiError::ServiceUnavailable(msg) => {
                warn!(error_code = code, message = %msg, "Service unavailable");
            }
            _ => {
                tracing::debug!(error_code = code, message = %message, "Client error");
            }
        }

        let body = ErrorResponse {
            error: message,
            code,
            status_code: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

/// Registry failures keep the remote status where Google gave a 4xx.
impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let message = err.to_string();
        let cause = match &err {
            RegistryError::Dependent { source } => source.as_ref(),
            other => other,
        };
        match cause {
            RegistryError::MissingParameter(_) => ApiError::BadRequest(message),
            RegistryError::Auth(_) => ApiError::Unauthorized(message),
            _ => match err.status_code().and_then(|s| StatusCode::from_u16(s).ok()) {
                Some(StatusCode::NOT_FOUND) => ApiError::NotFound(message),
                Some(StatusCode::BAD_REQUEST) => ApiError::BadRequest(message),
                Some(StatusCode::UNAUTHORIZED) => ApiError::Unauthorized(message),
                Some(StatusCode::FORBIDDEN) => ApiError::Forbidden(message),
                Some(status) if status.is_client_error() => ApiError::Upstream(status, message),
                _ => ApiError::BadGateway(message),
            },
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let message = err.to_string();
        match err {
            CatalogError::Invalid(_) => ApiError::BadRequest(message),
            CatalogError::Credentials(_) => ApiError::Unauthorized(message),
            CatalogError::PermissionDenied(_) => ApiError::Forbidden(message),
            CatalogError::NotFound(_) => ApiError::NotFound(message),
            CatalogError::Api(_) | CatalogError::Unexpected(_) => ApiError::BadGateway(message),
        }
    }
}

/// Malformed or mistyped request bodies get the same envelope as other failures.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ProjectError> for ApiError {
    fn from(err: ProjectError) -> Self {
        ApiError::ServiceUnavailable(err.to_string())
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

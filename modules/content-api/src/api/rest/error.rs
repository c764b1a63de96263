use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Serialize;

use crate::domain::error::DomainError;

const INTERNAL_MESSAGE: &str = "Internal server error.";

/// `{"error": <message>}` body sent with every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// HTTP failure ready to be written to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, DomainError::NotFound.to_string())
    }
}

/// Map a domain error to its HTTP status and public message.
#[must_use]
pub fn domain_error_to_api_error(e: &DomainError) -> ApiError {
    match e {
        DomainError::NotFound => ApiError::not_found(),
        DomainError::Forbidden => ApiError::new(StatusCode::FORBIDDEN, e.to_string()),
        DomainError::Internal(msg) => {
            tracing::error!(error = ?e, "Internal error: {}", msg);
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
        }
        DomainError::Storage(_) => {
            tracing::error!(error = ?e, "Storage error occurred");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        domain_error_to_api_error(&e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

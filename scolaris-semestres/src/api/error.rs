//! API error type and the JSON error envelope
//!
//! Every failure leaves the service as `{success: false, message, error?}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// A semestre with the requested name already exists (400)
    #[error("Semestre with the same name already exists")]
    DuplicateName,

    /// The referenced filiere does not exist (400)
    #[error("Invalid filiere ID")]
    InvalidReference,

    /// No semestre with the requested id (404)
    #[error("Semestre not found")]
    NotFound,

    /// Request body is not valid JSON for the operation (400)
    #[error("Invalid request body")]
    InvalidBody(String),

    /// Unexpected store failure (500)
    #[error("An error occurred")]
    Internal(String),
}

/// Error envelope body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<scolaris_common::Error> for ApiError {
    fn from(err: scolaris_common::Error) -> Self {
        // The only UNIQUE column reachable by a write is nom_semestre
        if err.is_unique_violation() {
            ApiError::DuplicateName
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::DuplicateName | ApiError::InvalidReference | ApiError::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let detail = match &self {
            ApiError::InvalidBody(detail) | ApiError::Internal(detail) => Some(detail.clone()),
            _ => None,
        };

        if status.is_server_error() {
            error!("{}: {}", self, detail.as_deref().unwrap_or_default());
        } else {
            warn!("Request rejected ({}): {}", status.as_u16(), self);
        }

        let body = Json(ErrorResponse {
            success: false,
            message: self.to_string(),
            error: detail,
        });

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

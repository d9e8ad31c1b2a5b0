//! # V1 API Response Envelope
//!
//! Every v1 endpoint returns an [`ApiResponse<T>`] with exactly one of two
//! top-level fields:
//!
//! ```json
//! { "data": { ... } }
//! { "error": { "code": "unsupported_file_type", "message": "..." } }
//! ```
//!
//! Error codes are the snake_case names produced by [`GistError::code`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::GistError;

/// Structured error payload within the API envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    /// Safe to display; internal details are never included.
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    /// HTTP status to use in the response. Not serialized on the wire.
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success response with data (HTTP 200).
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: StatusCode::OK,
        }
    }

    pub fn error(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
            status,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(_) => {
                let body = serde_json::json!({
                    "error": {
                        "code": "internal_error",
                        "message": "An internal error occurred"
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl<T: Serialize> From<GistError> for ApiResponse<T> {
    fn from(err: GistError) -> Self {
        if err.status() == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err, stage = %err.stage(), "Internal error mapped to v1 response");
        }
        ApiResponse::error(err.status(), err.code(), err.public_message())
    }
}

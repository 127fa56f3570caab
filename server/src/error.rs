//! HTTP error responses: `{"error": "..."}` with a matching status

use antenna_field::{DecodeError, RenderError, SimError};
use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    PayloadTooLarge,
    Internal(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn session_not_found(id: &str) -> Self {
        AppError::NotFound(format!("Unknown session: {}", id))
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            AppError::BadRequest(msg) | AppError::NotFound(msg) => msg.as_str(),
            AppError::PayloadTooLarge => "File is too large",
            AppError::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(detail) => error!("Internal error: {}", detail),
            other => warn!("Request rejected ({}): {}", other.status(), other.message()),
        }
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

impl From<SimError> for AppError {
    fn from(err: SimError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::BadRequest(format!("Error processing file: {}", err))
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Field(e) => e.into(),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::BadRequest(err.body_text())
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(err.to_string())
    }
}

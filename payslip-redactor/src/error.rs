// Plain-text HTTP error responses

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use payslip_redactor_core::pipeline::PipelineError;
use std::fmt;
use tracing::{error, warn};

#[derive(Debug)]
pub struct ApiError {
    pub message: String,
    pub status_code: StatusCode,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::BAD_REQUEST,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn custom(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status_code.is_server_error() {
            error!(status = %self.status_code, message = %self.message, "Request failed");
        } else {
            warn!(status = %self.status_code, message = %self.message, "Request rejected");
        }
        // String bodies are sent as text/plain; charset=utf-8.
        (self.status_code, self.message).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        if err.is_client_error() {
            return ApiError::bad_request(err.to_string());
        }
        error!(error = %err, "Redaction pipeline failed");
        ApiError::internal("Redaction failed on the server. Please try again.")
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::custom(err.status(), err.body_text())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        error!(error = ?err, "I/O error while building response");
        ApiError::internal("Could not read the result archive.")
    }
}

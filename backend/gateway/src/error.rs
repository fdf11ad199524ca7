//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docverify_core::VerifyError;
use docverify_logging::redact_sensitive_data;
use serde_json::json;
use tracing::{error, warn};

/// Error returned by route handlers. Renders as `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    /// Caller input problem; the message is shown as-is.
    Client { status: StatusCode, message: String },
    /// Downstream failure; the client sees only `message`, the cause is logged.
    Failed {
        message: &'static str,
        source: VerifyError,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Client {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn failed(message: &'static str, source: VerifyError) -> Self {
        Self::Failed { message, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Client { status, .. } => *status,
            Self::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self::Client {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Client { message, .. } => {
                warn!(status = %status, message = %message, "Rejected request");
                message
            }
            Self::Failed { message, source } => {
                error!(
                    error = %redact_sensitive_data(&source.to_string()),
                    "{}", message
                );
                message.to_string()
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

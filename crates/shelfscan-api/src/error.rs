//! API error types.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use shelfscan_store::StoreError;
use shelfscan_vision::VisionError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The framework refused the request body; carries its status.
    #[error("Upload rejected: {message}")]
    Upload { status: StatusCode, message: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn upload(status: StatusCode, msg: impl Into<String>) -> Self {
        Self::Upload {
            status,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upload { status, .. } => *status,
            ApiError::Vision(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) | ApiError::Vision(_) | ApiError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::upload(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::upload(err.status(), err.body_text())
    }
}

/// Error body: `{"detail": ...}`.
#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) detail: String,
}

/// Generic detail shown in place of server error messages in production.
pub const HIDDEN_DETAIL: &str = "An internal error occurred";

/// Response extension marking a body built from a server-side `ApiError`.
///
/// `middleware::hide_error_details` swaps such bodies for `HIDDEN_DETAIL`.
#[derive(Debug, Clone, Copy)]
pub struct ServerErrorDetail;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = self.to_string();
        let mut response = (status, Json(ErrorResponse { detail })).into_response();

        if status.is_server_error() {
            error!(error = %self, "Request failed");
            response.extensions_mut().insert(ServerErrorDetail);
        }

        response
    }
}

//! HTTP error mapping.
//!
//! Every failure leaves the handler as `{"error": "<message>"}` with a
//! status that tells the client whose fault it was:
//!
//! | Error                    | Status |
//! |--------------------------|--------|
//! | [`UploadError`]          | 400    |
//! | [`CaptionError`]         | 502    |
//! | [`ApiError::Internal`]   | 500    |

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::caption::CaptionError;
use crate::frames::ImageError;

/// The upload itself is unusable.  Never retried server-side.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("expected a multipart/form-data upload: {0}")]
    NotMultipart(String),

    #[error("malformed multipart body: {0}")]
    Multipart(String),

    #[error("missing form field `file`")]
    MissingFile,

    #[error("invalid image: {0}")]
    InvalidImage(#[from] ImageError),
}

impl From<MultipartRejection> for UploadError {
    fn from(e: MultipartRejection) -> Self {
        UploadError::NotMultipart(e.body_text())
    }
}

impl From<MultipartError> for UploadError {
    fn from(e: MultipartError) -> Self {
        UploadError::Multipart(e.body_text())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("captioning failed: {0}")]
    Caption(#[from] CaptionError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::Caption(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::warn!("server: {self}");
        } else {
            log::debug!("server: rejected upload: {self}");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

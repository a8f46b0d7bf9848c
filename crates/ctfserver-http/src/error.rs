//! Mapping of failures onto HTTP responses.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;
use tracing::error;

use ctfserver_core::TreeError;
use ctfserver_ops::{ListError, Rejection, UploadError};

use crate::models::ErrorResponse;

/// Errors returned by request handlers.
///
/// The `Display` text is for logs and may carry paths or OS errors;
/// clients only ever see [`ApiError::public_message`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("malformed multipart body: {0}")]
    MalformedForm(String),

    #[error("no file field in upload")]
    NoFileProvided,

    #[error("upload rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("tree build failed: {0}")]
    Tree(#[from] TreeError),

    #[error("listing failed: {0}")]
    List(#[from] ListError),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("blocking task failed: {0}")]
    Blocking(String),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl ApiError {
    /// Message safe to return to the client.
    pub fn public_message(&self) -> String {
        match self {
            Self::MalformedForm(_) => "Failed to parse form data".to_string(),
            Self::NoFileProvided => "No file provided".to_string(),
            Self::Rejected(rejection) => rejection.to_string(),
            Self::Upload(err) if err.is_user_error() => err.to_string(),
            Self::Upload(_) => "Failed to save file".to_string(),
            Self::Tree(_) => "Failed to read directory".to_string(),
            Self::List(_) => "Failed to list uploads".to_string(),
            Self::MethodNotAllowed => "Method not allowed".to_string(),
            Self::Blocking(_) | Self::Panicked(_) => "Internal server error".to_string(),
        }
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        Self::Blocking(err.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedForm(_) | Self::NoFileProvided | Self::Rejected(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Upload(err) if err.is_user_error() => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Upload(_)
            | Self::Tree(_)
            | Self::List(_)
            | Self::Blocking(_)
            | Self::Panicked(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        HttpResponse::build(status).json(ErrorResponse::new(self.public_message()))
    }
}

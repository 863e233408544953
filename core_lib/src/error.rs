//! Application error types and the status-code mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authorization header is missing")]
    Unauthorized,

    #[error("Invalid authentication token")]
    InvalidCredential,

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("{0}")]
    InvalidParameter(String),

    #[error("No file uploaded")]
    NoFileUploaded,

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("File exceeds the maximum allowed size of {limit} bytes")]
    UploadTooLarge { limit: u64 },

    #[error("Too many files: at most {max} file(s) per request")]
    TooManyFiles { max: usize },

    #[error("Unexpected file field: {0}")]
    UnexpectedField(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Method {method} is not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "Unauthorized",
            AppError::InvalidCredential => "InvalidCredential",
            AppError::MissingParameter(_) => "MissingParameter",
            AppError::InvalidParameter(_) => "InvalidParameter",
            AppError::NoFileUploaded => "NoFileUploaded",
            AppError::UnsupportedFileType(_) => "UnsupportedFileType",
            AppError::UploadTooLarge { .. } => "UploadTooLarge",
            AppError::TooManyFiles { .. } => "TooManyFiles",
            AppError::UnexpectedField(_) => "UnexpectedField",
            AppError::FileNotFound(_) => "FileNotFound",
            AppError::PermissionDenied(_) => "PermissionDenied",
            AppError::BadRequest(_) => "BadRequest",
            AppError::RouteNotFound(_) => "NotFound",
            AppError::MethodNotAllowed { .. } => "MethodNotAllowed",
            AppError::Internal(_) => "InternalError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidCredential => StatusCode::UNAUTHORIZED,
            AppError::MissingParameter(_)
            | AppError::InvalidParameter(_)
            | AppError::NoFileUploaded
            | AppError::UnsupportedFileType(_)
            | AppError::UnexpectedField(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UploadTooLarge { .. } | AppError::TooManyFiles { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            AppError::FileNotFound(_) | AppError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller. Internal failures stay opaque.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(anyhow::anyhow!(message.into()))
    }
}

/// Attached to every error response so the error-responder middleware can log
/// the failure with request context.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub message: String,
    /// Full error chain for unexpected failures, including a backtrace when
    /// one was captured.
    pub detail: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();
        let message = self.public_message();

        let detail = match &self {
            AppError::Internal(err) => Some(format!("{:?}", err)),
            _ => None,
        };

        let body = Json(json!({
            "error": kind,
            "message": message,
        }));

        let mut response = (status, body).into_response();
        response.extensions_mut().insert(ErrorReport {
            kind,
            message,
            detail,
        });
        response
    }
}

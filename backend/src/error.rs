//! Error taxonomy for the packaging pipeline and the HTTP surface.
//!
//! `DecodeError` is a caller problem and maps to 400. Template, archive,
//! storage and timeout failures are environment problems and map to 500.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use scormhub_common::model::launch::ErrorResponse;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A launch token that is not a well-formed, authentic token for this key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("token is not valid base64")]
    NotBase64,

    #[error("token is too short")]
    Truncated,

    #[error("unsupported token version {0}")]
    UnsupportedVersion(u8),

    #[error("token failed authentication")]
    Tampered,

    #[error("token payload is malformed: {0}")]
    Malformed(&'static str),
}

/// The media storage rejected a write or read.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage name {0:?}")]
    InvalidName(String),

    #[error("file {0:?} not found in storage")]
    NotFound(String),

    #[error("storage I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures of the wrapper customization pipeline.
#[derive(Debug, Error)]
pub enum PackagingError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("invalid launch identity: {0}")]
    InvalidIdentity(String),

    #[error("template archive {path:?} unavailable: {reason}")]
    TemplateUnavailable { path: PathBuf, reason: String },

    #[error("could not build output archive: {0}")]
    ArchiveWrite(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("package materialization exceeded {0:?}")]
    MaterializeTimeout(Duration),

    #[error("failed to record package: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Errors returned by the CloudScorm client.
#[derive(Debug, Error)]
pub enum LmsError {
    #[error("LMS is not configured: {0}")]
    NotConfigured(&'static str),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("LMS returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unexpected LMS response: {0}")]
    Parse(String),
}

/// Error type of every HTTP handler.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Packaging(#[from] PackagingError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Lms(#[from] LmsError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DecodeError> for AppError {
    fn from(e: DecodeError) -> Self {
        AppError::Packaging(PackagingError::Decode(e))
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(name) => AppError::NotFound(format!("File not found: {name}")),
            other => AppError::Packaging(PackagingError::Storage(other)),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Packaging(PackagingError::Decode(_)) => StatusCode::BAD_REQUEST,
            AppError::Packaging(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Lms(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }
        // Internal details stay in the log.
        let error = match self {
            AppError::Packaging(PackagingError::Decode(_)) => "Invalid launch identifier".to_string(),
            AppError::Database(_) | AppError::Internal(_) | AppError::Packaging(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(status).json(ErrorResponse { error })
    }
}

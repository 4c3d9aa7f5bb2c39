use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("validation error: {0}")]
    Validation(String),
    /// No endpoint candidate answered for the requested route.
    #[error("no usable endpoint found")]
    Unavailable,
    #[error("remote API responded with {status}: {body}")]
    RemoteApi { status: u16, body: String },
    #[error("unexpected content type: {content_type}")]
    UnexpectedContentType { content_type: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("deployment platform error: {0}")]
    Deployment(String),
    #[error("interrupted before completion")]
    Interrupted,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;

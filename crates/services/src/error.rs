//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::SessionError;

/// Errors emitted by exam backends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("backend responded with status {status}: {detail}")]
    HttpStatus {
        status: reqwest::StatusCode,
        detail: String,
    },
    #[error("backend returned no questions for {subject}")]
    NoQuestions { subject: String },
    #[error("backend is unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while assembling or running an exam.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors emitted by report exporters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    #[error("unknown export format: {0}")]
    UnknownFormat(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid backend url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

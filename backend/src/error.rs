// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Quiz engine transition failures. All are local, synchronous precondition checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    /// Empty candidate name on start.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transition attempted in the wrong phase.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Question index outside the bank.
    #[error("question index {index} out of range (bank has {size} questions)")]
    OutOfRange { index: usize, size: usize },
}

/// Question bank loading failures.
#[derive(Debug, Error)]
pub enum BankError {
    #[error("invalid question: {0}")]
    InvalidQuestion(String),

    #[error("question bank is empty")]
    Empty,

    #[error("failed to read question bank: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse question bank: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Results store failures. Never leave the store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("auth error: {0}")]
    Auth(String),

    #[error("invalid store url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("remote store returned {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("malformed row: {0}")]
    MalformedRow(String),
}

/// Startup configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    // 500 Internal Server Error
    #[error("internal server error: {0}")]
    InternalServerError(String),

    // 400 Bad Request
    #[error("bad request: {0}")]
    BadRequest(String),

    // 409 Conflict (wrong phase, submission in flight)
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Maps engine failures to HTTP semantics so handlers can use `?`.
/// An out-of-range index means the bank and session disagree; that is fatal.
impl From<QuizError> for AppError {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::InvalidInput(msg) => AppError::BadRequest(msg),
            QuizError::InvalidState(msg) => AppError::Conflict(msg),
            e @ QuizError::OutOfRange { .. } => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

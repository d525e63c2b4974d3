use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("This link has expired")]
    LinkExpired,

    #[error("This link is not available")]
    LinkUnavailable,

    #[error("Failed to save questions: {0}")]
    PersistenceFailure(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            Error::LinkExpired => (
                StatusCode::GONE,
                json!({ "error": "link_expired", "message": "This link has expired" }),
            ),
            Error::LinkUnavailable => (
                StatusCode::NOT_FOUND,
                json!({ "error": "link_unavailable", "message": "This link is not available" }),
            ),
            other => {
                let (status, error_message) = match other {
                    Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
                    Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
                    Error::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
                    Error::Json(err) => (StatusCode::BAD_REQUEST, err.to_string()),
                    Error::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
                    Error::PersistenceFailure(msg) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to save questions: {}", msg),
                    ),
                    Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
                    Error::Io(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
                    Error::Anyhow(err) => (StatusCode::BAD_REQUEST, err.to_string()),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An unexpected error occurred".to_string(),
                    ),
                };
                (status, json!({ "error": error_message }))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Error::Internal(format!("Migration failed: {}", err))
    }
}

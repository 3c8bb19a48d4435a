use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid rating: {0}")]
    InvalidRating(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Invalid upstream data: {0}")]
    InvalidUpstreamData(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Uniqueness violation reported by a store. MovieCache resolves this
    /// into a read of the existing record; rating and watchlist writes
    /// surface it as a conflict.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::AlreadyExists(db.message().to_string())
            }
            _ => AppError::Storage(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::InvalidUpstreamData(err.to_string())
        } else {
            AppError::UpstreamUnavailable(err.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidQuery(msg)
            | AppError::InvalidLimit(msg)
            | AppError::InvalidRating(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::UpstreamUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            AppError::UpstreamError(_) | AppError::InvalidUpstreamData(_) => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::AlreadyExists(msg) => (StatusCode::CONFLICT, msg),
            AppError::Configuration(_)
            | AppError::Storage(_)
            | AppError::Cache(_)
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

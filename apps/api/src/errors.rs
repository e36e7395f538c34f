use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Shared by authentication and authorization failures so callers cannot
/// tell a missing resource from someone else's.
pub const PERMISSION_MESSAGE: &str = "You don't have permission to do this";
pub const INVALID_DATA_MESSAGE: &str = "Invalid data provided";
pub const PLAN_LIMIT_MESSAGE: &str = "You have reached your plan limit. Upgrade your plan to continue.";
pub const RATE_LIMIT_MESSAGE: &str = "Woah! Slow down. Please try again later.";
pub const UPSTREAM_MESSAGE: &str = "Something went wrong. Please try again.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Plan limit reached")]
    PlanLimit,

    #[error("Rate limited")]
    RateLimited,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Voice provider error: {0}")]
    Voice(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Generic validation failure without field-level detail.
    pub fn invalid_data() -> Self {
        AppError::Validation(INVALID_DATA_MESSAGE.to_string())
    }

    /// Status, stable machine code and the message safe to show a user.
    /// Internal failures are logged here and replaced by a generic message.
    pub fn public_parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                PERMISSION_MESSAGE.to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                PERMISSION_MESSAGE.to_string(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::PlanLimit => (
                StatusCode::FORBIDDEN,
                "PLAN_LIMIT",
                PLAN_LIMIT_MESSAGE.to_string(),
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                RATE_LIMIT_MESSAGE.to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    UPSTREAM_MESSAGE.to_string(),
                )
            }
            AppError::Cache(e) => {
                tracing::error!("Cache error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CACHE_ERROR",
                    UPSTREAM_MESSAGE.to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (StatusCode::BAD_GATEWAY, "LLM_ERROR", UPSTREAM_MESSAGE.to_string())
            }
            AppError::Voice(msg) => {
                tracing::error!("Voice provider error: {msg}");
                (StatusCode::BAD_GATEWAY, "VOICE_ERROR", UPSTREAM_MESSAGE.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    UPSTREAM_MESSAGE.to_string(),
                )
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {e}");
        AppError::invalid_data()
    }
}

impl From<PathRejection> for AppError {
    fn from(e: PathRejection) -> Self {
        tracing::debug!("Rejected path parameter: {e}");
        AppError::invalid_data()
    }
}

impl From<MultipartRejection> for AppError {
    fn from(e: MultipartRejection) -> Self {
        tracing::debug!("Rejected multipart request: {e}");
        AppError::invalid_data()
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        tracing::debug!("Rejected multipart body: {e}");
        AppError::invalid_data()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.public_parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

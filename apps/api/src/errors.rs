use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub const QUOTA_EXCEEDED_MESSAGE: &str = "Limit reached. Upgrade to continue.";
pub const PREMIUM_ONLY_MESSAGE: &str = "This feature is only available for premium subscriptions";
pub const RESUME_TOO_LARGE_MESSAGE: &str = "Resume file size exceeds allowed size (5MB).";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Everything except `Unauthorized` renders as a 200 carrying
/// `{"success": false, "message": ...}`; clients branch on the flag, not the status.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    EntitlementExceeded(String),

    #[error("{0}")]
    Validation(String),

    #[error("Resume file size exceeds allowed size (5MB).")]
    PayloadTooLarge,

    #[error("{0}")]
    Provider(String),

    #[error("Database error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn quota_exceeded() -> Self {
        AppError::EntitlementExceeded(QUOTA_EXCEEDED_MESSAGE.to_string())
    }

    pub fn premium_only() -> Self {
        AppError::EntitlementExceeded(PREMIUM_ONLY_MESSAGE.to_string())
    }

    pub fn provider(err: impl std::fmt::Display) -> Self {
        AppError::Provider(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::EntitlementExceeded(msg) | AppError::Validation(msg) => {
                (StatusCode::OK, msg.clone())
            }
            AppError::PayloadTooLarge => (StatusCode::OK, RESUME_TOO_LARGE_MESSAGE.to_string()),
            AppError::Provider(msg) => {
                tracing::error!("Provider error: {msg}");
                (StatusCode::OK, msg.clone())
            }
            AppError::Persistence(e) => {
                tracing::error!("Database error: {e}");
                (StatusCode::OK, "A database error occurred".to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::OK, "An internal server error occurred".to_string())
            }
        };

        let body = Json(json!({
            "success": false,
            "message": message
        }));

        (status, body).into_response()
    }
}

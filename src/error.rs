//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Not Found")]
    NotFound,
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Decoding(String),
    /// Error carrying its own status, for hooks and custom stores.
    #[error("{message}")]
    Status { code: StatusCode, message: String },
    #[error("{0}")]
    Db(#[from] sqlx::Error),
    #[error("{0}")]
    Serialization(#[from] serde_json::Error),
    #[error("request cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("{0}")]
    Backend(String),
}

impl AppError {
    pub fn status(code: StatusCode, message: impl Into<String>) -> Self {
        AppError::Status {
            code,
            message: message.into(),
        }
    }

    pub fn backend(err: impl std::fmt::Display) -> Self {
        AppError::Backend(err.to_string())
    }

    /// Status code the default handler reports for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Validation(_) | AppError::Decoding(_) => StatusCode::BAD_REQUEST,
            AppError::Status { code, .. } => *code,
            AppError::Db(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            AppError::Config(_)
            | AppError::Db(_)
            | AppError::Serialization(_)
            | AppError::Cancelled
            | AppError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == StatusCode::NOT_FOUND
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }
        let body = ErrorBody {
            error: match &self {
                AppError::Db(sqlx::Error::RowNotFound) => AppError::NotFound.to_string(),
                other => other.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Turns an error escaping the dispatch pipeline into a response.
pub type ErrorHandler = Arc<dyn Fn(AppError) -> Response + Send + Sync>;

/// Reports the error's status with a `{"error": "<message>"}` body.
pub fn default_error_handler() -> ErrorHandler {
    Arc::new(|err: AppError| err.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn method_not_allowed_body() {
        let response = default_error_handler()(AppError::MethodNotAllowed);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body_of(response).await,
            serde_json::json!({ "error": "Method Not Allowed" })
        );
    }

    #[tokio::test]
    async fn custom_status_is_reported_verbatim() {
        let response = AppError::status(StatusCode::CONFLICT, "name taken").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_of(response).await["error"], "name taken");
    }

    #[tokio::test]
    async fn unrecognized_errors_default_to_500_with_raw_text() {
        let response = AppError::backend("disk on fire").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await["error"], "disk on fire");
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(err.is_not_found());
        assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::DeadlineExceeded.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }
}

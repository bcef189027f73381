use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Canvas API error: {0}")]
    Canvas(String),

    #[error("Notion API error: {0}")]
    Notion(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{count} Notion pages share Canvas ID {canvas_id}")]
    AmbiguousLookup { canvas_id: i64, count: usize },

    #[error("Internal server error")]
    InternalServerError,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Config(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AmbiguousLookup { canvas_id, count } => (
                StatusCode::CONFLICT,
                format!("{} Notion pages share Canvas ID {}", count, canvas_id),
            ),
            AppError::Canvas(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Notion(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Http(e) => {
                error!("http error: {}", e);
                (StatusCode::BAD_GATEWAY, "Upstream request failed".to_string())
            }
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}

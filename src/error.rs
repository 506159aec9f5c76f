use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::lipsync::ToolError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Message input is required")]
    MissingMessage,

    #[error("Invalid AI response: {0}")]
    InvalidAiResponse(String),

    #[error("Failed to parse AI response: {0}")]
    ParseAiResponse(String),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("External tool failed: {0}")]
    Tool(#[from] ToolError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::MissingMessage => (StatusCode::BAD_REQUEST, "Message input is required."),
            AppError::InvalidAiResponse(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Invalid AI response.")
            }
            AppError::ParseAiResponse(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to parse AI response.",
            ),
            AppError::Upstream(_) | AppError::Tool(_) | AppError::IoError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error.")
            }
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Upstream(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::sync::Arc;
use tracing::Instrument;

use super::{ChatRequest, ChatResponse, HealthResponse};
use crate::api::routes::AppState;
use crate::error::AppError;

pub async fn index() -> &'static str {
    "Hello World!"
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    // Anything that doesn't carry a message is treated as a missing message
    let message = match request {
        Ok(Json(ChatRequest { message: Some(m) })) if !m.is_empty() => m,
        Ok(_) => return Err(AppError::MissingMessage),
        Err(rejection) => {
            tracing::debug!("Rejected chat body: {}", rejection);
            return Err(AppError::MissingMessage);
        }
    };

    let span = tracing::info_span!("chat", request_id = %uuid::Uuid::new_v4());
    let messages = state.chat.reply(&message).instrument(span).await?;

    Ok(Json(ChatResponse { messages }))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

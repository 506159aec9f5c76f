pub mod handlers;
pub mod routes;

use serde::{Deserialize, Serialize};

use crate::chat::EnrichedSegment;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub messages: Vec<EnrichedSegment>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

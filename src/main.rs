use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod ai;
mod api;
mod chat;
mod config;
mod error;
mod lipsync;

use ai::OpenAiClient;
use api::routes::{create_router, AppState};
use chat::ChatService;
use config::Config;
use lipsync::{FfmpegTranscoder, RhubarbAligner};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Configuration from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let addr = match config.addr() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Talking Tutor Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Chat model: {}, voice: {}", config.openai.chat_model, config.openai.tts_voice);
    tracing::info!(
        "Lip sync tools: {} / {}",
        config.tools.ffmpeg.display(),
        config.tools.rhubarb.display()
    );

    // Wire the external capabilities
    let openai = match OpenAiClient::new(config.openai.clone()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Failed to create API client: {}", e);
            std::process::exit(1);
        }
    };
    let transcoder = Arc::new(FfmpegTranscoder::new(
        config.tools.ffmpeg.clone(),
        config.tools.timeout,
    ));
    let aligner = Arc::new(RhubarbAligner::new(
        config.tools.rhubarb.clone(),
        config.tools.recognizer.clone(),
        config.tools.timeout,
    ));

    let chat = ChatService::new(
        openai.clone(),
        openai,
        transcoder,
        aligner,
        config.enrich_concurrency,
    );

    // Create app state
    let state = Arc::new(AppState { chat });

    // Create router
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Tutor listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}

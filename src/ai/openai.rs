use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{ChatCompletion, ChatModel, SpeechSynthesizer};
use crate::config::OpenAiSettings;
use crate::error::AppError;

/// Client for an OpenAI-compatible chat-completion and speech API.
pub struct OpenAiClient {
    http: Client,
    settings: OpenAiSettings,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
    messages: [RequestMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'static str,
}

impl OpenAiClient {
    pub fn new(settings: OpenAiSettings) -> Result<Self, AppError> {
        let http = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { http, settings })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url, path)
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, AppError> {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.settings.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("{} returned {}: {}", path, status, body)));
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<ChatCompletion, AppError> {
        let request = CompletionRequest {
            model: &self.settings.chat_model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: [
                RequestMessage {
                    role: "system",
                    content: system,
                },
                RequestMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let body = self.post("chat/completions", &request).await?.text().await?;
        serde_json::from_str(&body).map_err(|e| AppError::InvalidAiResponse(e.to_string()))
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AppError> {
        let request = SpeechRequest {
            model: &self.settings.tts_model,
            voice: &self.settings.tts_voice,
            input: text,
            response_format: "mp3",
        };

        let audio = self.post("audio/speech", &request).await?.bytes().await?;
        if audio.is_empty() {
            return Err(AppError::Upstream("speech API returned no audio".into()));
        }

        Ok(audio.to_vec())
    }
}

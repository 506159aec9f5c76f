pub mod openai;
pub mod prompt;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;

pub use openai::OpenAiClient;

/// A chat-completion backend that answers a system + user prompt.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<ChatCompletion, AppError>;
}

/// A text-to-speech backend returning encoded MP3 audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AppError>;
}

/// The subset of a chat-completion response this service reads.
///
/// Every level is optional so that a structurally broken response can be
/// told apart from a transport failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletion {
    /// Build a completion carrying a single assistant message.
    #[cfg(test)]
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            choices: Some(vec![Choice {
                message: Some(ChoiceMessage {
                    content: Some(content.into()),
                }),
            }]),
        }
    }

    /// The first choice's message, if the response has one.
    pub fn first_message(&self) -> Option<&ChoiceMessage> {
        self.choices.as_ref()?.first()?.message.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_message() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"[]"}}]}"#,
        )
        .unwrap();
        let message = completion.first_message().unwrap();
        assert_eq!(message.content.as_deref(), Some("[]"));
    }

    #[test]
    fn missing_levels_yield_none() {
        for body in [r#"{}"#, r#"{"choices":[]}"#, r#"{"choices":[{"index":0}]}"#] {
            let completion: ChatCompletion = serde_json::from_str(body).unwrap();
            assert!(completion.first_message().is_none(), "body: {}", body);
        }
    }

    #[test]
    fn null_content_is_kept_as_none() {
        let completion: ChatCompletion =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(completion.first_message().unwrap().content.is_none());
    }
}

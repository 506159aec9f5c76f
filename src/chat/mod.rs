pub mod segment;

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::stream::{self, StreamExt, TryStreamExt};

use crate::ai::prompt::TUTOR_SYSTEM_PROMPT;
use crate::ai::{ChatModel, SpeechSynthesizer};
use crate::error::AppError;
use crate::lipsync::{Aligner, Transcoder};

pub use segment::{parse_reply, EnrichedSegment, ReplySegment};

pub struct ChatService {
    model: Arc<dyn ChatModel>,
    speech: Arc<dyn SpeechSynthesizer>,
    transcoder: Arc<dyn Transcoder>,
    aligner: Arc<dyn Aligner>,
    concurrency: usize,
}

impl ChatService {
    pub fn new(
        model: Arc<dyn ChatModel>,
        speech: Arc<dyn SpeechSynthesizer>,
        transcoder: Arc<dyn Transcoder>,
        aligner: Arc<dyn Aligner>,
        concurrency: usize,
    ) -> Self {
        Self {
            model,
            speech,
            transcoder,
            aligner,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn reply(&self, message: &str) -> Result<Vec<EnrichedSegment>, AppError> {
        // 1. Ask the model
        let completion = self.model.complete(TUTOR_SYSTEM_PROMPT, message).await?;

        // 2. Validate the response shape
        let choice = completion.first_message().ok_or_else(|| {
            AppError::InvalidAiResponse(format!("no message in completion: {:?}", completion))
        })?;

        // 3. Parse the structured reply
        let content = choice
            .content
            .as_deref()
            .ok_or_else(|| AppError::ParseAiResponse("message has no content".into()))?;
        let segments = parse_reply(content)?;
        tracing::info!(segments = segments.len(), "parsed tutor reply");

        // 4. Enrich each segment, keeping model order
        stream::iter(segments.into_iter().enumerate())
            .map(|(index, segment)| self.enrich(index, segment))
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    async fn enrich(&self, index: usize, segment: ReplySegment) -> Result<EnrichedSegment, AppError> {
        let mp3 = self.speech.synthesize(&segment.text).await?;
        tracing::debug!(segment = index, bytes = mp3.len(), "speech synthesized");

        let wav = self.transcoder.transcode(&mp3).await?;
        let lipsync = self.aligner.align(&wav).await?;
        tracing::debug!(segment = index, cues = lipsync.mouth_cues.len(), "segment enriched");

        Ok(EnrichedSegment::new(segment, STANDARD.encode(&mp3), lipsync))
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::segment::{Animation, FacialExpression};
    use super::testing::*;
    use super::*;
    use crate::ai::{ChatCompletion, Choice};
    use crate::config::DEFAULT_ENRICH_CONCURRENCY;

    const THREE_SEGMENTS: &str = r#"[
        {"text": "one", "facialExpression": "smile", "animation": "Talking_1", "feedback": "a"},
        {"text": "two", "facialExpression": "sad", "animation": "Talking_2", "feedback": "b"},
        {"text": "three", "facialExpression": "angry", "animation": "Angry", "feedback": "c"}
    ]"#;

    #[tokio::test]
    async fn enriches_segments_in_model_order() {
        let speech = Arc::new(FakeSpeech::default());
        let service = service(
            Arc::new(FakeModel::replying(THREE_SEGMENTS)),
            speech.clone(),
            FakeAligner::default(),
            3,
        );

        let messages = service.reply("salam").await.unwrap();

        let texts: Vec<_> = messages.iter().map(|m| m.segment.text.as_str()).collect();
        assert_eq!(texts, ["one", "two", "three"]);
        for message in &messages {
            let audio = STANDARD.decode(&message.audio).unwrap();
            assert_eq!(audio, format!("mp3:{}", message.segment.text).into_bytes());
            assert!(!message.lipsync.mouth_cues.is_empty());
        }
        assert_eq!(speech.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn single_object_reply_becomes_one_message() {
        let service = service(
            Arc::new(FakeModel::replying(
                r#"{"text": "hala", "facialExpression": "surprised", "animation": "Dancing", "feedback": "fine"}"#,
            )),
            Arc::new(FakeSpeech::default()),
            FakeAligner::default(),
            2,
        );

        let messages = service.reply("hi").await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].segment.text, "hala");
        assert_eq!(messages[0].segment.facial_expression, FacialExpression::Surprised);
        assert_eq!(messages[0].segment.animation, Animation::Dancing);
        assert_eq!(messages[0].segment.feedback, "fine");
    }

    #[tokio::test]
    async fn missing_message_is_invalid_response() {
        let speech = Arc::new(FakeSpeech::default());
        let completion = ChatCompletion {
            choices: Some(vec![Choice { message: None }]),
        };
        let service = service(
            Arc::new(FakeModel::with_completion(completion)),
            speech.clone(),
            FakeAligner::default(),
            1,
        );

        let err = service.reply("hi").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidAiResponse(_)));
        assert_eq!(speech.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_json_skips_synthesis() {
        let speech = Arc::new(FakeSpeech::default());
        let service = service(
            Arc::new(FakeModel::replying("Sure! Here is your answer: [")),
            speech.clone(),
            FakeAligner::default(),
            1,
        );

        let err = service.reply("hi").await.unwrap_err();
        assert!(matches!(err, AppError::ParseAiResponse(_)));
        assert_eq!(speech.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn null_content_is_parse_error() {
        let completion: ChatCompletion =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
                .unwrap();
        let service = service(
            Arc::new(FakeModel::with_completion(completion)),
            Arc::new(FakeSpeech::default()),
            FakeAligner::default(),
            1,
        );

        let err = service.reply("hi").await.unwrap_err();
        assert!(matches!(err, AppError::ParseAiResponse(_)));
    }

    #[tokio::test]
    async fn tool_failure_stops_later_segments() {
        let speech = Arc::new(FakeSpeech::default());
        let aligner = FakeAligner {
            fail_on: [b"mp3:two".to_vec()].into_iter().collect(),
        };
        let service = service(
            Arc::new(FakeModel::replying(THREE_SEGMENTS)),
            speech.clone(),
            aligner,
            1,
        );

        let err = service.reply("hi").await.unwrap_err();
        assert!(matches!(err, AppError::Tool(_)));
        assert_eq!(*speech.spoken.lock().unwrap(), ["one", "two"]);
    }

    #[tokio::test]
    async fn default_concurrency_never_synthesizes_past_a_failure() {
        let speech = Arc::new(FakeSpeech::default());
        let aligner = FakeAligner {
            fail_on: [b"mp3:one".to_vec()].into_iter().collect(),
        };
        let service = service(
            Arc::new(FakeModel::replying(THREE_SEGMENTS)),
            speech.clone(),
            aligner,
            DEFAULT_ENRICH_CONCURRENCY,
        );

        let err = service.reply("hi").await.unwrap_err();
        assert!(matches!(err, AppError::Tool(_)));
        assert_eq!(*speech.spoken.lock().unwrap(), ["one"]);
        assert_eq!(speech.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn echoed_audio_field_is_overwritten() {
        let service = service(
            Arc::new(FakeModel::replying(r#"[{"text": "a", "audio": "model"}]"#)),
            Arc::new(FakeSpeech::default()),
            FakeAligner::default(),
            DEFAULT_ENRICH_CONCURRENCY,
        );

        let messages = service.reply("hi").await.unwrap();
        assert!(messages[0].segment.extra.get("audio").is_none());
        assert_eq!(STANDARD.decode(&messages[0].audio).unwrap(), b"mp3:a");
    }

    #[tokio::test]
    async fn empty_reply_needs_no_enrichment() {
        let speech = Arc::new(FakeSpeech::default());
        let service = service(
            Arc::new(FakeModel::replying("[]")),
            speech.clone(),
            FakeAligner::default(),
            2,
        );

        assert!(service.reply("hi").await.unwrap().is_empty());
        assert_eq!(speech.calls.load(Ordering::SeqCst), 0);
    }
}

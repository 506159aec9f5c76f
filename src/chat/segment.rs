use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::lipsync::LipSync;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacialExpression {
    Smile,
    Sad,
    Angry,
    Surprised,
    FunnyFace,
    #[default]
    #[serde(other)]
    Default,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Animation {
    #[serde(rename = "Talking_1")]
    Talking1,
    #[serde(rename = "Talking_2")]
    Talking2,
    #[serde(rename = "Talking_3")]
    Talking3,
    Crying,
    Laughing,
    Dancing,
    Terrified,
    Angry,
    #[default]
    #[serde(other)]
    Idle,
}

/// One message of the tutor's reply, as produced by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplySegment {
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub facial_expression: FacialExpression,
    #[serde(default, deserialize_with = "null_as_default")]
    pub animation: Animation,
    #[serde(default, deserialize_with = "null_as_default")]
    pub feedback: String,
    /// Fields the model added beyond the schema, echoed back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A reply segment with its synthesized audio and mouth timing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedSegment {
    #[serde(flatten)]
    pub segment: ReplySegment,
    /// Base64 of the MP3 bytes.
    pub audio: String,
    pub lipsync: LipSync,
}

impl EnrichedSegment {
    /// Attach derived fields, replacing any same-named fields the model echoed.
    pub fn new(mut segment: ReplySegment, audio: String, lipsync: LipSync) -> Self {
        segment.extra.remove("audio");
        segment.extra.remove("lipsync");
        Self {
            segment,
            audio,
            lipsync,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

lazy_static! {
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n?(.*?)\s*```\s*$").unwrap();
}

/// Parse the model's message content into an ordered list of segments.
///
/// Accepts an array of segment objects, a single segment object, or an
/// object wrapping the array under one key (e.g. `{"messages": [...]}`).
pub fn parse_reply(content: &str) -> Result<Vec<ReplySegment>, AppError> {
    let body = strip_code_fence(content);
    let value: Value =
        serde_json::from_str(body).map_err(|e| AppError::ParseAiResponse(e.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(object) => match unwrap_single_array(object) {
            Ok(items) => items,
            Err(object) => vec![Value::Object(object)],
        },
        other => {
            return Err(AppError::ParseAiResponse(format!(
                "unexpected response format: {}",
                kind_of(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                return Err(AppError::ParseAiResponse(format!(
                    "segment {} is {}, not an object",
                    i,
                    kind_of(&item)
                )));
            }
            serde_json::from_value(item)
                .map_err(|e| AppError::ParseAiResponse(format!("segment {}: {}", i, e)))
        })
        .collect()
}

fn strip_code_fence(content: &str) -> &str {
    match CODE_FENCE.captures(content).and_then(|cap| cap.get(1)) {
        Some(inner) => inner.as_str(),
        None => content,
    }
}

fn unwrap_single_array(mut object: Map<String, Value>) -> Result<Vec<Value>, Map<String, Value>> {
    if object.contains_key("text") || object.len() != 1 {
        return Err(object);
    }

    let Some(key) = object.keys().next().cloned() else {
        return Err(object);
    };

    match object.remove(&key) {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => {
            object.insert(key, other);
            Err(object)
        }
        None => Err(object),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Segment pipelines in flight per request unless `ENRICH_CONCURRENCY` says otherwise.
pub const DEFAULT_ENRICH_CONCURRENCY: usize = 1;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub openai: OpenAiSettings,
    pub tools: ToolSettings,
    pub enrich_concurrency: usize,
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub tts_model: String,
    pub tts_voice: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ToolSettings {
    pub ffmpeg: PathBuf,
    pub rhubarb: PathBuf,
    pub recognizer: String,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;

        let openai = OpenAiSettings {
            api_key,
            base_url: var("OPENAI_BASE_URL", "https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
            chat_model: var("CHAT_MODEL", "gpt-4o"),
            max_tokens: parse(&lookup, "CHAT_MAX_TOKENS", 1000)?,
            temperature: parse(&lookup, "CHAT_TEMPERATURE", 0.6)?,
            tts_model: var("TTS_MODEL", "tts-1"),
            tts_voice: var("TTS_VOICE", "fable"),
            timeout: Duration::from_secs(parse(&lookup, "OPENAI_TIMEOUT_SECS", 60)?),
        };

        let tools = ToolSettings {
            ffmpeg: var("FFMPEG_BIN", "ffmpeg").into(),
            rhubarb: var("RHUBARB_BIN", "./bin/rhubarb/rhubarb").into(),
            recognizer: var("RHUBARB_RECOGNIZER", "phonetic"),
            timeout: Duration::from_secs(parse(&lookup, "TOOL_TIMEOUT_SECS", 60)?),
        };

        Ok(Self {
            host: var("HOST", "0.0.0.0"),
            port: parse(&lookup, "PORT", 3000)?,
            openai,
            tools,
            enrich_concurrency: parse(&lookup, "ENRICH_CONCURRENCY", DEFAULT_ENRICH_CONCURRENCY)?
                .max(1),
        })
    }

    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::Invalid {
            name: "HOST",
            value: addr,
        })
    }
}

fn parse<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use hound::WavReader;
use tokio::process::Command;

use super::{read_output, run_tool, scratch_dir, write_input, ToolError, Transcoder};

const TOOL: &str = "ffmpeg";

/// Transcodes MP3 to WAV by shelling out to ffmpeg.
pub struct FfmpegTranscoder {
    binary: PathBuf,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(binary: PathBuf, timeout: Duration) -> Self {
        Self { binary, timeout }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, audio: &[u8]) -> Result<Vec<u8>, ToolError> {
        let dir = scratch_dir(TOOL)?;
        let input = dir.path().join("message.mp3");
        let output = dir.path().join("message.wav");

        write_input(TOOL, &input, audio).await?;

        let mut command = Command::new(&self.binary);
        command
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(&input)
            .arg(&output);
        run_tool(TOOL, command, self.timeout).await?;

        let wav = read_output(TOOL, &output).await?;
        let info = inspect_wav(&wav)?;
        tracing::debug!(
            sample_rate = info.sample_rate,
            channels = info.channels,
            duration_secs = info.duration_secs,
            "transcoded to wav"
        );

        Ok(wav)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_secs: f64,
}

/// Validate a WAV buffer and report its basic shape.
pub fn inspect_wav(wav: &[u8]) -> Result<WavInfo, ToolError> {
    let reader = WavReader::new(Cursor::new(wav)).map_err(|e| ToolError::InvalidOutput {
        tool: TOOL,
        reason: format!("not a WAV file: {}", e),
    })?;

    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(ToolError::InvalidOutput {
            tool: TOOL,
            reason: "zero sample rate".to_string(),
        });
    }

    Ok(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        duration_secs: reader.duration() as f64 / spec.sample_rate as f64,
    })
}

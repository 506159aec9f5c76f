use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::{read_output, run_tool, scratch_dir, write_input, Aligner, LipSync, ToolError};

const TOOL: &str = "rhubarb";

/// Runs Rhubarb Lip Sync against a WAV file and parses its JSON export.
pub struct RhubarbAligner {
    binary: PathBuf,
    recognizer: String,
    timeout: Duration,
}

impl RhubarbAligner {
    pub fn new(binary: PathBuf, recognizer: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary,
            recognizer: recognizer.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Aligner for RhubarbAligner {
    async fn align(&self, wav: &[u8]) -> Result<LipSync, ToolError> {
        let dir = scratch_dir(TOOL)?;
        let input = dir.path().join("message.wav");
        let output = dir.path().join("message.json");

        write_input(TOOL, &input, wav).await?;

        let mut command = Command::new(&self.binary);
        command
            .args(["-f", "json", "-o"])
            .arg(&output)
            .arg(&input)
            .arg("-r")
            .arg(&self.recognizer);
        run_tool(TOOL, command, self.timeout).await?;

        let json = read_output(TOOL, &output).await?;
        let lipsync = parse_export(&json)?;
        tracing::debug!(cues = lipsync.mouth_cues.len(), "lip sync aligned");

        Ok(lipsync)
    }
}

/// Parse Rhubarb's JSON export, reducing the sound file path to its name.
pub fn parse_export(json: &[u8]) -> Result<LipSync, ToolError> {
    let mut lipsync: LipSync =
        serde_json::from_slice(json).map_err(|e| ToolError::InvalidOutput {
            tool: TOOL,
            reason: e.to_string(),
        })?;

    if let Some(name) = Path::new(&lipsync.metadata.sound_file).file_name() {
        lipsync.metadata.sound_file = name.to_string_lossy().into_owned();
    }

    Ok(lipsync)
}

pub mod ffmpeg;
pub mod rhubarb;

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

pub use ffmpeg::FfmpegTranscoder;
pub use rhubarb::RhubarbAligner;

#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("failed to start {tool} (is it installed?): {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with status {status:?}: {stderr}")]
    Failed {
        tool: &'static str,
        status: Option<i32>,
        stderr: String,
    },

    #[error("{tool} did not finish within {timeout:?}")]
    TimedOut { tool: &'static str, timeout: Duration },

    #[error("{tool} produced no output at {path:?}")]
    MissingOutput { tool: &'static str, path: PathBuf },

    #[error("{tool} produced unusable output: {reason}")]
    InvalidOutput { tool: &'static str, reason: String },

    #[error("{tool} working file error: {source}")]
    Io {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Converts synthesized audio into the format the aligner reads.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, audio: &[u8]) -> Result<Vec<u8>, ToolError>;
}

/// Derives mouth-shape timing from WAV audio.
#[async_trait]
pub trait Aligner: Send + Sync {
    async fn align(&self, wav: &[u8]) -> Result<LipSync, ToolError>;
}

/// Rhubarb's JSON export format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LipSync {
    pub metadata: LipSyncMetadata,
    pub mouth_cues: Vec<MouthCue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LipSyncMetadata {
    pub sound_file: String,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouthCue {
    pub start: f64,
    pub end: f64,
    pub value: MouthShape,
}

/// Rhubarb mouth shapes. `X` is the idle/closed position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouthShape {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    X,
}

/// Run an external tool to completion, killing it if it outlives `timeout`.
pub(crate) async fn run_tool(
    tool: &'static str,
    mut command: Command,
    timeout: Duration,
) -> Result<(), ToolError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let started = Instant::now();
    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| ToolError::TimedOut { tool, timeout })?
        .map_err(|source| ToolError::Spawn { tool, source })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(ToolError::Failed {
            tool,
            status: output.status.code(),
            stderr,
        });
    }

    tracing::debug!(tool, elapsed_ms = started.elapsed().as_millis() as u64, "tool finished");
    Ok(())
}

pub(crate) async fn write_input(tool: &'static str, path: &Path, data: &[u8]) -> Result<(), ToolError> {
    tokio::fs::write(path, data)
        .await
        .map_err(|source| ToolError::Io { tool, source })
}

pub(crate) async fn read_output(tool: &'static str, path: &Path) -> Result<Vec<u8>, ToolError> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(data),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ToolError::MissingOutput {
            tool,
            path: path.to_path_buf(),
        }),
        Err(source) => Err(ToolError::Io { tool, source }),
    }
}

pub(crate) fn scratch_dir(tool: &'static str) -> Result<tempfile::TempDir, ToolError> {
    tempfile::Builder::new()
        .prefix("tutor-")
        .tempdir()
        .map_err(|source| ToolError::Io { tool, source })
}

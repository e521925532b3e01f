//! External media tooling.
//!
//! Both capabilities sit behind traits so the pipeline can run against
//! canned results in tests. The real implementations shell out to
//! `ffprobe` and `ffmpeg`.

use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

pub mod ffmpeg;
pub mod ffprobe;

pub use ffmpeg::Ffmpeg;
pub use ffprobe::Ffprobe;

#[derive(Debug, Error)]
pub enum MediaToolError {
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} timed out after {after:?}")]
    Timeout { tool: &'static str, after: Duration },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: &'static str,
        status: ExitStatus,
        stderr: String,
    },

    #[error("unparseable {tool} output: {source}")]
    Parse {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("no video stream with dimensions found")]
    NoVideoStream,

    #[error("{tool} produced no output at {path}")]
    MissingOutput { tool: &'static str, path: String },
}

/// Pixel dimensions of the primary video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait MediaInspector: Send + Sync {
    async fn video_geometry(&self, path: &Path) -> Result<Geometry, MediaToolError>;
}

#[async_trait]
pub trait MediaRemuxer: Send + Sync {
    /// Rewrites `source` into `output` with the moov atom up front,
    /// copying streams without re-encoding.
    async fn remux_faststart(&self, source: &Path, output: &Path) -> Result<(), MediaToolError>;
}

/// Runs a prepared command to completion under a deadline.
///
/// The child is killed if the returned future is dropped, which is how
/// request cancellation reaches the process.
pub(crate) async fn run_tool(
    tool: &'static str,
    mut command: Command,
    deadline: Duration,
) -> Result<Output, MediaToolError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio::time::timeout(deadline, command.output())
        .await
        .map_err(|_| MediaToolError::Timeout {
            tool,
            after: deadline,
        })?
        .map_err(|source| MediaToolError::Spawn { tool, source })?;

    if !output.status.success() {
        return Err(MediaToolError::Failed {
            tool,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

use super::{Geometry, MediaInspector, MediaToolError, run_tool};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::process::Command;

const TOOL: &str = "ffprobe";

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Ffprobe {
    binary: String,
    timeout: Duration,
}

impl Ffprobe {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MediaInspector for Ffprobe {
    #[tracing::instrument(skip(self), fields(process.executable.name = TOOL))]
    async fn video_geometry(&self, path: &Path) -> Result<Geometry, MediaToolError> {
        let start = Instant::now();

        let mut command = Command::new(&self.binary);
        command
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path);

        let output = run_tool(TOOL, command, self.timeout).await?;
        let geometry = parse_geometry(&output.stdout)?;

        tracing::debug!(
            duration_ms = start.elapsed().as_millis(),
            width = geometry.width,
            height = geometry.height,
            "Video probe completed"
        );

        Ok(geometry)
    }
}

/// Reads the first video stream's dimensions out of `ffprobe -show_streams`
/// JSON. When no stream is tagged as video the first stream is used.
pub fn parse_geometry(stdout: &[u8]) -> Result<Geometry, MediaToolError> {
    let probe: ProbeOutput =
        serde_json::from_slice(stdout).map_err(|source| MediaToolError::Parse { tool: TOOL, source })?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .or_else(|| probe.streams.first())
        .ok_or(MediaToolError::NoVideoStream)?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) => Ok(Geometry { width, height }),
        _ => Err(MediaToolError::NoVideoStream),
    }
}

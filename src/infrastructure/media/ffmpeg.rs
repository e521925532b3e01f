use super::{MediaRemuxer, MediaToolError, run_tool};
use async_trait::async_trait;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::process::Command;

const TOOL: &str = "ffmpeg";

#[derive(Debug, Clone)]
pub struct Ffmpeg {
    binary: String,
    timeout: Duration,
}

impl Ffmpeg {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MediaRemuxer for Ffmpeg {
    #[tracing::instrument(skip(self), fields(process.executable.name = TOOL))]
    async fn remux_faststart(&self, source: &Path, output: &Path) -> Result<(), MediaToolError> {
        let start = Instant::now();

        let mut command = Command::new(&self.binary);
        command
            .args(["-nostdin", "-v", "error", "-y", "-i"])
            .arg(source)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(output);

        run_tool(TOOL, command, self.timeout).await?;

        // A zero exit without a usable file still counts as a failure.
        let written = tokio::fs::metadata(output)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if written == 0 {
            return Err(MediaToolError::MissingOutput {
                tool: TOOL,
                path: output.display().to_string(),
            });
        }

        tracing::debug!(
            duration_ms = start.elapsed().as_millis(),
            size_bytes = written,
            "Fast-start remux completed"
        );

        Ok(())
    }
}

//! Staging inbound byte streams on local disk.
//!
//! Every staged file is held as a [`TempPath`], so it is unlinked when the
//! owner drops it, whether the request finished, failed, or was cancelled.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::io::ErrorKind;
use std::path::Path;
use tempfile::TempPath;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::warn;

pub const TEMP_PREFIX: &str = "tubely-upload-";

#[derive(Debug, Error)]
pub enum StageError<E> {
    #[error("stream exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("stream interrupted: {0}")]
    Stream(E),

    #[error("temp file error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct StagedFile {
    pub path: TempPath,
    pub size: u64,
}

/// Copies `stream` into a fresh, uniquely named file under `dir`.
///
/// Fails with [`StageError::TooLarge`] as soon as more than `limit` bytes
/// arrive. On any error the partially written file is removed.
pub async fn stage_stream<S, E>(
    stream: S,
    dir: &Path,
    extension: &str,
    limit: u64,
) -> Result<StagedFile, StageError<E>>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    let suffix = format!(".{}", extension);
    let (file, path) = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(&suffix)
        .tempfile_in(dir)?
        .into_parts();
    let mut file = tokio::fs::File::from_std(file);

    futures_util::pin_mut!(stream);

    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(StageError::Stream)?;

        written += chunk.len() as u64;
        if written > limit {
            return Err(StageError::TooLarge { limit });
        }

        file.write_all(&chunk).await?;
    }

    file.flush().await?;

    Ok(StagedFile {
        path,
        size: written,
    })
}

/// Removes a staged file now instead of at drop. A file that is already
/// gone counts as released.
pub fn release_temp(path: TempPath) {
    let shown = path.display().to_string();
    if let Err(e) = path.close() {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %shown, error = %e, "Failed to remove temp file");
        }
    }
}

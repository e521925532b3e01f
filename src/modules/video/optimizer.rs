use super::error::UploadError;
use crate::infrastructure::media::MediaRemuxer;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

pub const PROCESSING_SUFFIX: &str = ".processing";

/// Sibling of `source` that receives the remuxed copy.
pub fn optimized_path_for(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_owned();
    name.push(PROCESSING_SUFFIX);
    PathBuf::from(name)
}

/// Produces a fast-start copy of `source`.
///
/// The output path is owned from before the tool starts, so a failed or
/// cancelled run cannot leave a partial file behind.
pub async fn optimize(remuxer: &dyn MediaRemuxer, source: &Path) -> Result<TempPath, UploadError> {
    let output = TempPath::try_from_path(optimized_path_for(source))?;

    remuxer.remux_faststart(source, &output).await?;

    Ok(output)
}

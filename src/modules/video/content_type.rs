use super::error::UploadError;
use mime::Mime;
use std::fmt;

/// Media types the video pipeline accepts. Adding a format means adding a
/// variant here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoContentType {
    Mp4,
}

impl VideoContentType {
    /// Parses a part's `Content-Type` header and matches on the essence,
    /// so parameters and letter case never decide acceptance.
    pub fn from_header(header: Option<&str>) -> Result<Self, UploadError> {
        let raw = header
            .ok_or_else(|| UploadError::Validation("Missing content type on video part".to_string()))?;

        let parsed: Mime = raw
            .parse()
            .map_err(|_| UploadError::Validation(format!("Unparseable content type: {}", raw)))?;

        match parsed.essence_str().to_ascii_lowercase().as_str() {
            "video/mp4" => Ok(VideoContentType::Mp4),
            other => Err(UploadError::Validation(format!(
                "Unsupported content type: {}",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoContentType::Mp4 => "video/mp4",
        }
    }

    pub fn extension(&self) -> &'static str {
        extension_for(self.as_str())
    }
}

impl fmt::Display for VideoContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File extension for a MIME essence. Unknown types get `bin`.
pub fn extension_for(essence: &str) -> &'static str {
    match essence {
        "video/mp4" => "mp4",
        "image/jpeg" => "jpg",
        "image/png" => "png",
        _ => "bin",
    }
}

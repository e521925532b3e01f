use crate::infrastructure::media::MediaInspector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};
use utoipa::ToSchema;

/// Coarse frame-shape bucket. Also the first segment of the object key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AspectClass {
    Landscape,
    Portrait,
    Other,
}

impl AspectClass {
    /// Both bounds are exclusive: 16:9 sits inside (1.7, 1.8), 9:16 inside
    /// (0.5, 0.6).
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 1.7 && ratio < 1.8 {
            AspectClass::Landscape
        } else if ratio > 0.5 && ratio < 0.6 {
            AspectClass::Portrait
        } else {
            AspectClass::Other
        }
    }

    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if height == 0 {
            return AspectClass::Other;
        }
        Self::from_ratio(f64::from(width) / f64::from(height))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectClass::Landscape => "landscape",
            AspectClass::Portrait => "portrait",
            AspectClass::Other => "other",
        }
    }
}

impl fmt::Display for AspectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies the file at `path`. Never fails: any probe problem is logged
/// and yields [`AspectClass::Other`].
pub async fn probe_aspect(inspector: &dyn MediaInspector, path: &Path) -> AspectClass {
    match inspector.video_geometry(path).await {
        Ok(geometry) => {
            let class = AspectClass::from_dimensions(geometry.width, geometry.height);
            debug!(
                width = geometry.width,
                height = geometry.height,
                aspect = %class,
                "Classified video geometry"
            );
            class
        }
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Geometry probe failed, falling back to other");
            AspectClass::Other
        }
    }
}

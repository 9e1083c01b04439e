//! Pure Rust dimension probe.
//!
//! | Format | Crate / function |
//! |---|---|
//! | JPEG, PNG, TIFF, WebP | `image::image_dimensions` (header only, no decode) |
//! | AVIF | `avif-parse` container metadata |

use super::probe::{DimensionProbe, Dimensions, ProbeError};
use std::path::Path;

/// Probe backed by the `image` crate ecosystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageProbe;

impl ImageProbe {
    pub fn new() -> Self {
        Self
    }
}

fn is_avif(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("avif"))
}

/// Extract dimensions from an AVIF file's container metadata.
fn identify_avif(path: &Path) -> Result<Dimensions, ProbeError> {
    let file_data = std::fs::read(path)?;
    let avif = avif_parse::read_avif(&mut std::io::Cursor::new(&file_data)).map_err(|e| {
        ProbeError::Unreadable(format!("Failed to parse AVIF {}: {e:?}", path.display()))
    })?;
    let meta = avif.primary_item_metadata().map_err(|e| {
        ProbeError::Unreadable(format!(
            "Failed to read AVIF metadata {}: {e:?}",
            path.display()
        ))
    })?;
    Ok(Dimensions {
        height: meta.max_frame_height.get(),
        width: meta.max_frame_width.get(),
    })
}

impl DimensionProbe for ImageProbe {
    fn identify(&self, path: &Path) -> Result<Dimensions, ProbeError> {
        if is_avif(path) {
            return identify_avif(path);
        }
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            ProbeError::Unreadable(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Dimensions { height, width })
    }
}

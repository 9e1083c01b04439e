//! Dimension probe trait and shared types.
//!
//! The [`DimensionProbe`] trait is the only thing the builder knows about
//! image files. The production implementation is
//! [`ImageProbe`](super::image_probe::ImageProbe); tests substitute
//! [`tests::MockProbe`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unreadable image: {0}")]
    Unreadable(String),
}

/// Pixel size of a page image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub height: u32,
    pub width: u32,
}

/// Canvas size used when an image cannot be probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultDimensions {
    /// 1000 high × 700 wide.
    #[default]
    Portrait,
    /// 750 high × 1000 wide.
    Landscape,
}

impl DefaultDimensions {
    pub fn dimensions(self) -> Dimensions {
        match self {
            Self::Portrait => Dimensions {
                height: 1000,
                width: 700,
            },
            Self::Landscape => Dimensions {
                height: 750,
                width: 1000,
            },
        }
    }
}

/// Reads the pixel dimensions of an image file.
pub trait DimensionProbe {
    fn identify(&self, path: &Path) -> Result<Dimensions, ProbeError>;
}

impl<P: DimensionProbe + ?Sized> DimensionProbe for &P {
    fn identify(&self, path: &Path) -> Result<Dimensions, ProbeError> {
        (**self).identify(path)
    }
}

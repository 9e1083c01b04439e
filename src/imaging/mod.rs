//! Image inspection in pure Rust, header reads only.
//!
//! The builder never decodes pixels; it only needs the height and width of
//! each page to size its canvas.
//!
//! - **Probe**: [`DimensionProbe`] trait, [`Dimensions`], fallback sizes
//! - **ImageProbe**: the production probe (`image` + `avif-parse`)

pub mod image_probe;
pub mod probe;

pub use image_probe::ImageProbe;
pub use probe::{DefaultDimensions, DimensionProbe, Dimensions, ProbeError};

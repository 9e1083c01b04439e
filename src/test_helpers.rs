//! Shared test utilities for the iiif-builder test suite.
//!
//! Provides fixture writers, lookup helpers and bulk extractors that work
//! with the document model (`Manifest`, `Range`, `Canvas`).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_page(tmp.path(), "box_1/folder_1-2/img001.jpg");
//! let report = build_manifest(tmp.path(), &CollectionConfig::default(), None, None).unwrap();
//!
//! let folder = find_range(&report.manifest, "box_1/folder_1-2");
//! assert_eq!(folder.canvases.len(), 1);
//! assert_eq!(range_ids(&report.manifest), vec!["top", "file-system", "box_1", "box_1/folder_1-2"]);
//! ```

use crate::document::{Manifest, Range};
use image::ImageEncoder;
use std::path::Path;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write a real JPEG of the given size.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let encoder = image::codecs::jpeg::JpegEncoder::new(file);
    encoder
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Create `root/<rel>` (and its parent directories) as a small JPEG.
pub fn write_page(root: &Path, rel: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    create_test_jpeg(&path, 8, 6);
}

// =========================================================================
// Manifest lookups: panics with a clear message on miss
// =========================================================================

/// Find a range by `@id`. Panics if not found.
pub fn find_range<'a>(manifest: &'a Manifest, id: &str) -> &'a Range {
    manifest
        .ranges()
        .iter()
        .find(|r| r.id == id)
        .unwrap_or_else(|| panic!("range '{id}' not found. Available: {:?}", range_ids(manifest)))
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// All range ids in `structures` order.
pub fn range_ids(manifest: &Manifest) -> Vec<&str> {
    manifest.ranges().iter().map(|r| r.id.as_str()).collect()
}

/// All canvas labels in sequence order.
pub fn canvas_labels(manifest: &Manifest) -> Vec<&str> {
    manifest
        .sequence()
        .canvases
        .iter()
        .map(|c| c.label.as_str())
        .collect()
}

/// Assert that the ranges below `parent` match an expected shape.
///
/// Each entry is `(child id, grandchild ids)`. Use `&[]` for leaves.
///
/// ```rust
/// assert_range_shape(&manifest, "file-system", &[
///     ("box_1", &["box_1/folder_1-2"]),
///     ("box_2", &[]),
/// ]);
/// ```
pub fn assert_range_shape(manifest: &Manifest, parent: &str, expected: &[(&str, &[&str])]) {
    let actual: Vec<&str> = find_range(manifest, parent)
        .ranges
        .iter()
        .map(String::as_str)
        .collect();
    let expected_ids: Vec<&str> = expected.iter().map(|(id, _)| *id).collect();
    assert_eq!(actual, expected_ids, "children of '{parent}' mismatch");

    for (id, children) in expected {
        let actual_children: Vec<&str> = find_range(manifest, id)
            .ranges
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(
            actual_children,
            children.to_vec(),
            "children of '{id}' mismatch"
        );
    }
}

//! The IIIF Presentation v2 document model.
//!
//! Everything the builder produces lives here: one [`Manifest`] owning an
//! ordered arena of [`Range`]s (serialized as `structures`) and exactly one
//! [`Sequence`] of [`Canvas`]es.
//!
//! ## Ownership
//!
//! ```text
//! Manifest
//! ├── structures: [Range, Range, ...]     ← arena, addressed by RangeId
//! │     └── ranges / canvases: [String]   ← cross-links by @id only
//! └── sequence: Sequence
//!       └── canvases: [Canvas]            ← embedded, placement order
//! ```
//!
//! Ranges never own each other or their canvases: a range lists the `@id`s
//! of its children. That keeps the tree plus its cross-links (a folder range
//! that is also filed under an archival series, a directory range that is
//! also listed under a subject) free of reference cycles.
//!
//! Field declaration order is serialization order, so the same sequence of
//! builder calls always yields byte-identical JSON.

use crate::imaging::Dimensions;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

pub const PRESENTATION_CONTEXT: &str = "http://iiif.io/api/presentation/2/context.json";
pub const IMAGE_CONTEXT: &str = "http://iiif.io/api/image/2/context.json";
pub const IMAGE_PROFILE: &str = "http://iiif.io/api/image/2/level2.json";

/// A `{label, value}` pair in a `metadata[]` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataEntry {
    pub label: String,
    pub value: String,
}

/// Append a metadata pair unless the value is empty.
///
/// Every descriptive field in the document goes through here, so an absent
/// lookup never shows up as `""` in the output.
pub fn push_metadata(entries: &mut Vec<MetadataEntry>, label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    entries.push(MetadataEntry {
        label: label.to_string(),
        value: value.to_string(),
    });
}

/// Handle to a range inside the [`Manifest`] that minted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RangeId(usize);

/// The root document.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub attribution: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub logo: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataEntry>,
    structures: Vec<Range>,
    #[serde(rename = "sequences", serialize_with = "single_sequence")]
    sequence: Sequence,
    #[serde(skip)]
    range_ids: HashMap<String, RangeId>,
}

fn single_sequence<S: Serializer>(sequence: &Sequence, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(std::iter::once(sequence))
}

impl Manifest {
    pub fn new(id: impl Into<String>, sequence_id: impl Into<String>) -> Self {
        Self {
            context: PRESENTATION_CONTEXT,
            id: id.into(),
            kind: "sc:Manifest",
            label: String::new(),
            description: String::new(),
            attribution: String::new(),
            logo: String::new(),
            metadata: Vec::new(),
            structures: Vec::new(),
            sequence: Sequence::new(sequence_id),
            range_ids: HashMap::new(),
        }
    }

    pub fn push_metadata(&mut self, label: &str, value: &str) {
        push_metadata(&mut self.metadata, label, value);
    }

    /// Append a range to `structures` and return its handle.
    ///
    /// A range whose `@id` is already taken is kept, but renamed with the
    /// first free `-N` suffix (starting at 2) so that every cross-link
    /// resolves to exactly one range. Callers must read the final id back
    /// through [`Manifest::range`] before linking to it.
    pub fn add_range(&mut self, mut range: Range) -> RangeId {
        if self.range_ids.contains_key(&range.id) {
            let base = std::mem::take(&mut range.id);
            let mut n = 2;
            range.id = loop {
                let candidate = format!("{base}-{n}");
                if !self.range_ids.contains_key(&candidate) {
                    break candidate;
                }
                n += 1;
            };
        }
        let handle = RangeId(self.structures.len());
        self.range_ids.insert(range.id.clone(), handle);
        self.structures.push(range);
        handle
    }

    pub fn range(&self, handle: RangeId) -> &Range {
        &self.structures[handle.0]
    }

    pub fn range_mut(&mut self, handle: RangeId) -> &mut Range {
        &mut self.structures[handle.0]
    }

    /// Look a range up by its `@id`.
    pub fn find_range(&self, id: &str) -> Option<RangeId> {
        self.range_ids.get(id).copied()
    }

    /// All ranges in creation order.
    pub fn ranges(&self) -> &[Range] {
        &self.structures
    }

    /// Append `child`'s id to `parent`'s `ranges[]`.
    pub fn link_range(&mut self, parent: RangeId, child: RangeId) {
        let child_id = self.range(child).id.clone();
        self.range_mut(parent).ranges.push(child_id);
    }

    /// Like [`Manifest::link_range`], but a no-op when already linked.
    pub fn link_range_once(&mut self, parent: RangeId, child: RangeId) {
        let child_id = self.range(child).id.clone();
        self.range_mut(parent).add_child_once(&child_id);
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn sequence_mut(&mut self) -> &mut Sequence {
        &mut self.sequence
    }
}

/// A navigable grouping node: a directory, an archival unit, a bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Range {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(rename = "viewingHint", skip_serializing_if = "Option::is_none")]
    pub viewing_hint: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataEntry>,
    pub ranges: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub canvases: Vec<String>,
}

impl Range {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "sc:Range",
            label: label.into(),
            viewing_hint: None,
            metadata: Vec::new(),
            ranges: Vec::new(),
            canvases: Vec::new(),
        }
    }

    pub fn with_viewing_hint(mut self, hint: &str) -> Self {
        self.viewing_hint = Some(hint.to_string());
        self
    }

    pub fn push_metadata(&mut self, label: &str, value: &str) {
        push_metadata(&mut self.metadata, label, value);
    }

    pub fn add_child_once(&mut self, id: &str) {
        if !self.ranges.iter().any(|r| r == id) {
            self.ranges.push(id.to_string());
        }
    }

    pub fn add_canvas(&mut self, id: &str) {
        self.canvases.push(id.to_string());
    }

    /// Look up a metadata value by label.
    pub fn metadata_value(&self, label: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|m| m.label == label)
            .map(|m| m.value.as_str())
    }
}

/// The single reading-order list of canvases.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sequence {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    #[serde(rename = "viewingHint", skip_serializing_if = "Option::is_none")]
    pub viewing_hint: Option<String>,
    pub canvases: Vec<Canvas>,
}

impl Sequence {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "sc:Sequence",
            viewing_hint: None,
            canvases: Vec::new(),
        }
    }
}

/// One page image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Canvas {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    pub height: u32,
    pub width: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataEntry>,
    pub images: Vec<ImageAnnotation>,
}

impl Canvas {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        dimensions: Dimensions,
        image: ImageAnnotation,
    ) -> Self {
        Self {
            id: id.into(),
            kind: "sc:Canvas",
            label: label.into(),
            height: dimensions.height,
            width: dimensions.width,
            metadata: Vec::new(),
            images: vec![image],
        }
    }

    pub fn push_metadata(&mut self, label: &str, value: &str) {
        push_metadata(&mut self.metadata, label, value);
    }

    pub fn metadata_value(&self, label: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|m| m.label == label)
            .map(|m| m.value.as_str())
    }
}

/// The `oa:Annotation` painting an image onto a canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageAnnotation {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub motivation: &'static str,
    pub on: String,
    pub resource: ImageResource,
}

impl ImageAnnotation {
    /// Build the annotation, resource and service for one image.
    ///
    /// `media_path` is the Image API base URI of the file; the resource is
    /// its full-size default rendition.
    pub fn new(
        id: impl Into<String>,
        on: impl Into<String>,
        media_path: &str,
        dimensions: Dimensions,
    ) -> Self {
        Self {
            context: PRESENTATION_CONTEXT,
            id: id.into(),
            kind: "oa:Annotation",
            motivation: "sc:painting",
            on: on.into(),
            resource: ImageResource {
                id: format!("{media_path}/full/full/0/default.jpg"),
                kind: "dctypes:Image",
                format: "image/jpeg",
                height: dimensions.height,
                width: dimensions.width,
                service: ImageService {
                    context: IMAGE_CONTEXT,
                    id: media_path.to_string(),
                    profile: IMAGE_PROFILE,
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageResource {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub format: &'static str,
    pub height: u32,
    pub width: u32,
    pub service: ImageService,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageService {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@id")]
    pub id: String,
    pub profile: &'static str,
}

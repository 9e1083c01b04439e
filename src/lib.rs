//! # IIIF Builder
//!
//! Builds IIIF Presentation API 2.x manifests from directory trees of page
//! images. Your filesystem is the data source: directories become ranges,
//! images become canvases, and TOML sidecars carry descriptive metadata.
//!
//! # Architecture
//!
//! ```text
//! collection/  ──walk──▶  ManifestBuilder  ──finalize──▶  manifest.json
//!                          │        │
//!                          │        └── Flavor (labels, extra structure)
//!                          └── RangeRegistry (directory → range)
//! ```
//!
//! One [`builder::ManifestBuilder`] owns one [`document::Manifest`] for the
//! whole run. [`scan`] drives it over the tree in sorted order; the collection
//! [`flavor`] decides how names read and what structure sits beside the plain
//! directory tree (archival components, decades, subjects).
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the source tree and feeds the builder |
//! | [`builder`] | Range and canvas construction, finalize, write |
//! | [`document`] | Serializable Presentation 2 model: manifest, ranges, sequence, canvases |
//! | [`flavor`] | Per-collection strategies: directory, ead, dublin-core, mets |
//! | [`registry`] | Directory path → range lookup, root-relative range ids |
//! | [`index`] | Box/folder matcher, decade and subject buckets |
//! | [`metadata`] | TOML sidecars, field lookup and fallback resolution |
//! | [`naming`] | Label translation (`b7_f12` → "Box 7 Folder 12") and URI joining |
//! | [`imaging`] | Header-only dimension probe with fallback sizes |
//! | [`config`] | `config.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Ids, Not References
//!
//! Ranges list the `@id`s of their child ranges and canvases instead of
//! owning them. A folder can be filed under both its box directory and an
//! archival series, a photo under both its directory and a decade, without
//! any shared ownership. Range ids are unique within a manifest; collisions
//! get a `-2`, `-3`, ... suffix.
//!
//! ## Deterministic Output
//!
//! The walk is sorted by file name and every map that reaches the output is
//! ordered, so the same tree always yields byte-identical JSON.
//!
//! ## No Pixel Decoding
//!
//! [`imaging`] reads image headers only. An image that cannot be read still
//! becomes a canvas with the configured fallback size.

pub mod builder;
pub mod config;
pub mod document;
pub mod flavor;
pub mod imaging;
pub mod index;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod registry;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;

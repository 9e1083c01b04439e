//! Descriptive metadata lookup.
//!
//! The builder never parses finding aids, METS records or spreadsheets. It
//! asks a [`MetadataSource`] for a fixed set of named [`Lookup`]s and gets
//! back zero or more strings. A lookup nobody can answer is simply empty;
//! no source ever fails for a missing field.
//!
//! ## Sources
//!
//! - [`NoMetadata`]: answers nothing. Used for bare directory trees.
//! - [`FieldMap`]: an in-memory map, built by hand or loaded from a sidecar.
//! - [`Layered`]: several sources in priority order; per lookup, the first
//!   source with a non-empty answer wins.
//!
//! ## Sidecar files
//!
//! Filesystem metadata is read from TOML sidecars:
//!
//! ```text
//! collection/
//! ├── metadata.toml          # collection (root) or directory metadata
//! └── box_1/
//!     ├── metadata.toml      # applies to every page in box_1
//!     ├── img001.jpg
//!     └── img001.toml        # applies to img001.jpg, overrides box_1/metadata.toml
//! ```
//!
//! ```toml
//! title = "Letter to the editor"
//! date_created = "1987-06-15"
//! subject = ["Correspondence", "Campus life"]
//! ```
//!
//! Unknown keys are rejected so that typos surface instead of silently
//! dropping a field.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of per-directory (and, at the root, collection) metadata.
pub const DIRECTORY_METADATA: &str = "metadata.toml";

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error reading {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("TOML parse error in {}: {}", .0.display(), .1)]
    Toml(PathBuf, #[source] toml::de::Error),
}

/// The named descriptive fields the builder asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lookup {
    Title,
    Attribution,
    Identifier,
    DateCreated,
    Creator,
    Description,
    Subject,
    Rights,
    Permalink,
    Publisher,
}

impl Lookup {
    /// Display label used for the `metadata[]` entry of this field.
    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Attribution => "Attribution",
            Self::Identifier => "Identifier",
            Self::DateCreated => "Date Created",
            Self::Creator => "Creator",
            Self::Description => "Description",
            Self::Subject => "Subject(s)",
            Self::Rights => "Rights",
            Self::Permalink => "Permanent URL",
            Self::Publisher => "Publisher",
        }
    }
}

/// Opaque key→value lookup over archival or bibliographic metadata.
pub trait MetadataSource {
    /// All values recorded for a field, in source order. Empty when absent.
    fn values(&self, lookup: Lookup) -> Vec<String>;

    /// The field as a single string: non-empty values joined with `"; "`,
    /// or `default` when there are none.
    fn get(&self, lookup: Lookup, default: &str) -> String {
        let joined = self
            .values(lookup)
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join("; ");
        if joined.is_empty() {
            default.to_string()
        } else {
            joined
        }
    }
}

impl<M: MetadataSource + ?Sized> MetadataSource for &M {
    fn values(&self, lookup: Lookup) -> Vec<String> {
        (**self).values(lookup)
    }
}

/// A source with nothing in it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMetadata;

impl MetadataSource for NoMetadata {
    fn values(&self, _lookup: Lookup) -> Vec<String> {
        Vec::new()
    }
}

/// In-memory field map.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldMap {
    fields: BTreeMap<Lookup, Vec<String>>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`FieldMap::insert`].
    pub fn with(mut self, lookup: Lookup, value: impl Into<String>) -> Self {
        self.insert(lookup, value);
        self
    }

    /// Add one value to a field. Repeated inserts accumulate.
    pub fn insert(&mut self, lookup: Lookup, value: impl Into<String>) {
        self.fields.entry(lookup).or_default().push(value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(|v| v.is_empty())
    }
}

impl MetadataSource for FieldMap {
    fn values(&self, lookup: Lookup) -> Vec<String> {
        self.fields.get(&lookup).cloned().unwrap_or_default()
    }
}

/// Several sources in priority order.
#[derive(Default)]
pub struct Layered<'a> {
    sources: Vec<&'a dyn MetadataSource>,
}

impl<'a> Layered<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a lower-priority source.
    pub fn then(mut self, source: &'a dyn MetadataSource) -> Self {
        self.sources.push(source);
        self
    }
}

impl MetadataSource for Layered<'_> {
    fn values(&self, lookup: Lookup) -> Vec<String> {
        self.sources
            .iter()
            .map(|s| s.values(lookup))
            .find(|values| values.iter().any(|v| !v.trim().is_empty()))
            .unwrap_or_default()
    }
}

/// Resolve a field from multiple candidates.
///
/// Takes optional values in priority order and returns the first
/// non-None, non-empty (after trimming) one.
///
/// ```text
/// manifest label: resolve(&[collection_title, configured_label])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// A string or a list of strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s],
            Self::Many(v) => v,
        }
    }
}

/// On-disk shape of a sidecar file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SidecarFields {
    title: Option<OneOrMany>,
    attribution: Option<OneOrMany>,
    identifier: Option<OneOrMany>,
    date_created: Option<OneOrMany>,
    creator: Option<OneOrMany>,
    description: Option<OneOrMany>,
    subject: Option<OneOrMany>,
    rights: Option<OneOrMany>,
    permalink: Option<OneOrMany>,
    publisher: Option<OneOrMany>,
}

impl From<SidecarFields> for FieldMap {
    fn from(sidecar: SidecarFields) -> Self {
        let mut map = FieldMap::new();
        let fields = [
            (Lookup::Title, sidecar.title),
            (Lookup::Attribution, sidecar.attribution),
            (Lookup::Identifier, sidecar.identifier),
            (Lookup::DateCreated, sidecar.date_created),
            (Lookup::Creator, sidecar.creator),
            (Lookup::Description, sidecar.description),
            (Lookup::Subject, sidecar.subject),
            (Lookup::Rights, sidecar.rights),
            (Lookup::Permalink, sidecar.permalink),
            (Lookup::Publisher, sidecar.publisher),
        ];
        for (lookup, value) in fields {
            for v in value.map(OneOrMany::into_vec).unwrap_or_default() {
                map.insert(lookup, v);
            }
        }
        map
    }
}

/// Parse a sidecar TOML file into a [`FieldMap`].
pub fn load_fields(path: &Path) -> Result<FieldMap, MetadataError> {
    let content =
        fs::read_to_string(path).map_err(|e| MetadataError::Io(path.to_path_buf(), e))?;
    let sidecar: SidecarFields =
        toml::from_str(&content).map_err(|e| MetadataError::Toml(path.to_path_buf(), e))?;
    Ok(sidecar.into())
}

/// Sidecar path for an image: `box_1/img001.jpg` → `box_1/img001.toml`.
pub fn sidecar_path(image_path: &Path) -> PathBuf {
    image_path.with_extension("toml")
}

/// Read an image's sidecar. `Ok(None)` when there is none.
pub fn read_sidecar(image_path: &Path) -> Result<Option<FieldMap>, MetadataError> {
    read_optional(&sidecar_path(image_path))
}

/// Read a directory's `metadata.toml`. `Ok(None)` when there is none.
pub fn read_directory_metadata(dir: &Path) -> Result<Option<FieldMap>, MetadataError> {
    read_optional(&dir.join(DIRECTORY_METADATA))
}

fn read_optional(path: &Path) -> Result<Option<FieldMap>, MetadataError> {
    if !path.is_file() {
        return Ok(None);
    }
    load_fields(path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // =========================================================================
    // MetadataSource::get
    // =========================================================================

    #[test]
    fn get_returns_default_when_absent() {
        assert_eq!(NoMetadata.get(Lookup::Title, ""), "");
        assert_eq!(NoMetadata.get(Lookup::Title, "Untitled"), "Untitled");
    }

    #[test]
    fn get_joins_repeated_values() {
        let meta = FieldMap::new()
            .with(Lookup::Subject, "Athletics")
            .with(Lookup::Subject, "  ")
            .with(Lookup::Subject, "Campus life");
        assert_eq!(meta.get(Lookup::Subject, ""), "Athletics; Campus life");
    }

    #[test]
    fn get_treats_whitespace_only_as_absent() {
        let meta = FieldMap::new().with(Lookup::Creator, "   ");
        assert_eq!(meta.get(Lookup::Creator, ""), "");
    }

    #[test]
    fn lookup_labels_match_output_labels() {
        assert_eq!(Lookup::DateCreated.label(), "Date Created");
        assert_eq!(Lookup::Subject.label(), "Subject(s)");
        assert_eq!(Lookup::Permalink.label(), "Permanent URL");
    }

    // =========================================================================
    // Layered
    // =========================================================================

    #[test]
    fn layered_prefers_first_non_empty_source() {
        let item = FieldMap::new().with(Lookup::Title, "Page one");
        let folder = FieldMap::new()
            .with(Lookup::Title, "Folder title")
            .with(Lookup::Rights, "Public domain");
        let layered = Layered::new().then(&item).then(&folder);

        assert_eq!(layered.get(Lookup::Title, ""), "Page one");
        assert_eq!(layered.get(Lookup::Rights, ""), "Public domain");
        assert_eq!(layered.get(Lookup::Creator, ""), "");
    }

    #[test]
    fn layered_skips_blank_values() {
        let item = FieldMap::new().with(Lookup::Title, " ");
        let folder = FieldMap::new().with(Lookup::Title, "Folder title");
        let layered = Layered::new().then(&item).then(&folder);
        assert_eq!(layered.get(Lookup::Title, ""), "Folder title");
    }

    // =========================================================================
    // resolve()
    // =========================================================================

    #[test]
    fn resolve_picks_first_non_empty() {
        assert_eq!(
            resolve(&[Some(""), None, Some("  Hoya Collection ")]),
            Some("Hoya Collection".to_string())
        );
    }

    #[test]
    fn resolve_returns_none_when_nothing_usable() {
        assert_eq!(resolve(&[None, Some("  ")]), None);
        assert_eq!(resolve(&[]), None);
    }

    // =========================================================================
    // Sidecars
    // =========================================================================

    #[test]
    fn read_sidecar_parses_fields() {
        let dir = TempDir::new().unwrap();
        let img = dir.path().join("img001.jpg");
        fs::write(&img, b"fake image").unwrap();
        fs::write(
            dir.path().join("img001.toml"),
            r#"
title = "Letter"
date_created = "19870615"
subject = ["Correspondence", "Alumni"]
"#,
        )
        .unwrap();

        let meta = read_sidecar(&img).unwrap().unwrap();
        assert_eq!(meta.get(Lookup::Title, ""), "Letter");
        assert_eq!(meta.get(Lookup::DateCreated, ""), "19870615");
        assert_eq!(
            meta.values(Lookup::Subject),
            vec!["Correspondence".to_string(), "Alumni".to_string()]
        );
        assert_eq!(meta.get(Lookup::Creator, ""), "");
    }

    #[test]
    fn read_sidecar_returns_none_when_no_file() {
        let dir = TempDir::new().unwrap();
        let img = dir.path().join("img001.jpg");
        assert!(read_sidecar(&img).unwrap().is_none());
    }

    #[test]
    fn read_sidecar_rejects_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let img = dir.path().join("img001.jpg");
        fs::write(dir.path().join("img001.toml"), "titel = \"typo\"\n").unwrap();

        let err = read_sidecar(&img).unwrap_err();
        assert!(matches!(err, MetadataError::Toml(..)));
        assert!(err.to_string().contains("img001.toml"));
    }

    #[test]
    fn read_directory_metadata_reads_metadata_toml() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(DIRECTORY_METADATA),
            "title = \"Box 1: Correspondence\"\nrights = \"In copyright\"\n",
        )
        .unwrap();

        let meta = read_directory_metadata(dir.path()).unwrap().unwrap();
        assert_eq!(meta.get(Lookup::Title, ""), "Box 1: Correspondence");
        assert_eq!(meta.get(Lookup::Rights, ""), "In copyright");
    }

    #[test]
    fn empty_sidecar_is_empty_map() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.toml");
        fs::write(&path, "").unwrap();
        assert!(load_fields(&path).unwrap().is_empty());
    }
}

//! Tree walk driver.
//!
//! Walks a collection directory and feeds every directory and page image to
//! a [`ManifestBuilder`], then writes the manifest.
//!
//! ## Directory Structure
//!
//! ```text
//! collection/                      # Source root
//! ├── config.toml                  # Build configuration (optional)
//! ├── metadata.toml                # Collection metadata (optional)
//! ├── finding-aid.toml             # Archival description (ead flavor)
//! ├── box_1/                       # Range "Box 1"
//! │   ├── metadata.toml            # Directory metadata (optional)
//! │   ├── folder_1-2/              # Range "folder_1-2", child of "Box 1"
//! │   │   ├── img001.jpg           # Canvas
//! │   │   └── img001.toml          # Page metadata (optional)
//! │   └── b1_f3/                   # Range "Box 1 Folder 3"
//! │       └── img001.jpg           # Different canvas id from the one above
//! └── .cache/                      # Hidden: skipped
//! ```
//!
//! ## Walk Order
//!
//! Entries are visited depth-first, sorted by file name, each directory
//! before its contents. The manifest is therefore the same for the same tree
//! no matter what order the filesystem lists it in.
//!
//! ## What Is Skipped
//!
//! - hidden entries (name starts with `.`), with everything below them
//! - `config.toml`, the finding aid and every `*.toml` sidecar
//! - files whose extension is not in `scan.extensions`
//!
//! ## Degraded Input
//!
//! A sidecar that does not parse is reported as
//! [`BuildEvent::MetadataUnreadable`] and treated as absent. Unreadable
//! images fall back to the configured size. Only an unreadable tree, a bad
//! finding aid or a target that cannot be written stop the build.

use crate::builder::{BuildError, BuildEvent, ManifestBuilder, check_manifest_file};
use crate::config::{CollectionConfig, ConfigError};
use crate::document::Manifest;
use crate::flavor::{FindingAid, FlavorKind, make_flavor};
use crate::imaging::{DimensionProbe, ImageProbe};
use crate::metadata::{
    DIRECTORY_METADATA, FieldMap, Layered, MetadataError, MetadataSource, NoMetadata,
    read_directory_metadata, read_sidecar, sidecar_path,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("Source is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// Result of one build.
#[derive(Debug)]
pub struct BuildReport {
    pub manifest: Manifest,
    pub flavor: &'static str,
    /// Directories turned into ranges, the walk root excluded.
    pub directories: usize,
    pub canvases: usize,
    /// Files that are neither pages nor control files.
    pub skipped: usize,
}

/// Build the manifest for `source` with the production image probe.
///
/// Writes to `target` when given; otherwise only returns the document.
pub fn build_manifest(
    source: &Path,
    config: &CollectionConfig,
    target: Option<&Path>,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildReport, ScanError> {
    build_manifest_with_probe(source, config, target, events, ImageProbe::new())
}

/// [`build_manifest`] with an explicit dimension probe.
pub fn build_manifest_with_probe<P: DimensionProbe>(
    source: &Path,
    config: &CollectionConfig,
    target: Option<&Path>,
    events: Option<Sender<BuildEvent>>,
    probe: P,
) -> Result<BuildReport, ScanError> {
    if !source.is_dir() {
        return Err(ScanError::NotADirectory(source.to_path_buf()));
    }

    let finding_aid = match config.flavor {
        FlavorKind::Ead => FindingAid::load(&source.join(&config.finding_aid))?,
        _ => FindingAid::default(),
    };
    let flavor = make_flavor(config.flavor, config.dimensions.fallback, finding_aid);

    if let Some(target) = target {
        check_manifest_file(target)?;
    }

    let mut builder = ManifestBuilder::new(source, &config.ids, flavor, probe);
    if let Some(tx) = events {
        builder = builder.with_events(tx);
    }

    let mut dir_metadata: HashMap<PathBuf, FieldMap> = HashMap::new();
    let collection = load_or_report(
        &builder,
        &source.join(DIRECTORY_METADATA),
        read_directory_metadata(source),
    );
    match &collection {
        Some(meta) => builder.describe(meta, &config.manifest),
        None => builder.describe(&NoMetadata, &config.manifest),
    }
    if let Some(meta) = collection {
        dir_metadata.insert(source.to_path_buf(), meta);
    }

    let output_file = source.join(&config.output);
    let finding_aid_file = source.join(&config.finding_aid);
    let config_file = source.join(crate::config::CONFIG_FILE);

    let mut directories = 0;
    let mut skipped = 0;

    let walker = WalkDir::new(source)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = entry?;
        if entry.depth() == 0 {
            continue;
        }
        let path = entry.path();

        if entry.file_type().is_dir() {
            let meta = load_or_report(
                &builder,
                &path.join(DIRECTORY_METADATA),
                read_directory_metadata(path),
            );
            builder.get_or_create_range_with(path, meta.as_ref().map(|m| m as &dyn MetadataSource));
            if let Some(meta) = meta {
                dir_metadata.insert(path.to_path_buf(), meta);
            }
            directories += 1;
            continue;
        }

        if is_control_file(path) || path == config_file || path == finding_aid_file {
            continue;
        }
        if !config.scan.is_page(path) {
            if path != output_file && target.is_none_or(|t| path != t) {
                skipped += 1;
            }
            continue;
        }

        let item = load_or_report(&builder, &sidecar_path(path), read_sidecar(path));
        let folder = path.parent().and_then(|dir| dir_metadata.get(dir));
        let mut layered = Layered::new();
        if let Some(item) = &item {
            layered = layered.then(item);
        }
        if let Some(folder) = folder {
            layered = layered.then(folder);
        }

        let key = path
            .strip_prefix(source)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();
        builder.add_canvas(&key, path, &layered);
    }

    let flavor = builder.flavor_name();
    if let Some(target) = target {
        builder.write(target)?;
    }
    let manifest = builder.into_manifest();
    let canvases = manifest.sequence().canvases.len();

    Ok(BuildReport {
        manifest,
        flavor,
        directories,
        canvases,
        skipped,
    })
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Sidecars and other TOML files never become pages.
fn is_control_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}

/// Unwrap an optional metadata read, reporting a parse failure instead of
/// propagating it.
fn load_or_report<P: DimensionProbe>(
    builder: &ManifestBuilder<P>,
    path: &Path,
    result: Result<Option<FieldMap>, MetadataError>,
) -> Option<FieldMap> {
    match result {
        Ok(meta) => meta,
        Err(e) => {
            builder.emit(BuildEvent::MetadataUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
            None
        }
    }
}

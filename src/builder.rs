//! Manifest hierarchy builder.
//!
//! [`ManifestBuilder`] owns everything one manifest run needs: the
//! [`Manifest`] under construction, the directory → range
//! [`RangeRegistry`], the collection [`Flavor`] and the [`DimensionProbe`].
//! Nothing is shared between runs.
//!
//! ## Lifecycle
//!
//! ```text
//! new()                     top range, flavor install, walk-root range
//!   describe()              manifest label / attribution / logo
//!   get_or_create_range()   one per directory, ancestors first
//!   add_canvas()            one per image
//! finalize()                flavor refine (idempotent)
//! write() / finalize_and_serialize() / into_manifest()
//! ```
//!
//! The walk root is registered by the constructor, so there is no way to ask
//! for a range or a canvas before the tree has a root.
//!
//! ## Degraded input
//!
//! The builder never prints and never fails on content. An unreadable image
//! gets the flavor's fallback size, a directory or file whose parent has no
//! range is left unlinked. Each of these is reported as a [`BuildEvent`] on
//! the optional channel given to [`ManifestBuilder::with_events`]. Only
//! writing the manifest file can fail.

use crate::config::{IdsConfig, ManifestConfig};
use crate::document::{Canvas, ImageAnnotation, Manifest, Range, RangeId};
use crate::flavor::{CanvasContext, Flavor};
use crate::imaging::{DimensionProbe, ImageProbe};
use crate::metadata::{Lookup, MetadataSource, resolve};
use crate::naming::{join_uri, normalize_key};
use crate::registry::RangeRegistry;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Cannot write to manifest file [{}]: {source}", path.display())]
    ManifestFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot write to manifest file [{}]", .0.display())]
    ReadOnly(PathBuf),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Structured diagnostics emitted while building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    RangeCreated {
        id: String,
        label: String,
    },
    CanvasAdded {
        id: String,
        label: String,
        height: u32,
        width: u32,
    },
    /// A directory or file whose parent directory has no range. The link was
    /// skipped.
    ParentRangeMissing {
        path: PathBuf,
    },
    /// The probe could not read an image; the fallback size was used.
    DimensionFallback {
        path: PathBuf,
        reason: String,
    },
    /// A sidecar could not be parsed and was ignored.
    MetadataUnreadable {
        path: PathBuf,
        reason: String,
    },
    /// A directory range was cross-filed under an archival range.
    FolderMatched {
        directory: String,
        range: String,
    },
    Refined {
        ranges: usize,
        canvases: usize,
    },
}

/// Pre-flight check for the target file.
///
/// Creates (or truncates) the file, writes nothing to it and verifies it is
/// writable, so a bad target fails before any tree is walked.
pub fn check_manifest_file(path: &Path) -> Result<(), BuildError> {
    fs::write(path, "").map_err(|source| BuildError::ManifestFile {
        path: path.to_path_buf(),
        source,
    })?;
    let metadata = fs::metadata(path).map_err(|source| BuildError::ManifestFile {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.permissions().readonly() {
        return Err(BuildError::ReadOnly(path.to_path_buf()));
    }
    Ok(())
}

pub struct ManifestBuilder<P = ImageProbe> {
    manifest: Manifest,
    registry: RangeRegistry,
    flavor: Box<dyn Flavor>,
    probe: P,
    ids: IdsConfig,
    top: RangeId,
    events: Option<Sender<BuildEvent>>,
    refined: bool,
}

impl<P: DimensionProbe> ManifestBuilder<P> {
    /// Start a manifest for the tree rooted at `root`.
    ///
    /// Creates the `viewingHint: top` range, lets the flavor install its own
    /// structure, then registers `root` and links it under the top range.
    pub fn new(
        root: impl Into<PathBuf>,
        ids: &IdsConfig,
        mut flavor: Box<dyn Flavor>,
        probe: P,
    ) -> Self {
        let root = root.into();
        let mut manifest = Manifest::new(&ids.manifest, &ids.sequence);

        let top = manifest
            .add_range(Range::new(&ids.top_range, flavor.top_label()).with_viewing_hint("top"));
        flavor.install(&mut manifest, top);

        let dir_name = file_name(&root);
        let mut root_range = Range::new(&ids.root_range, flavor.root_label(&dir_name));
        root_range.push_metadata("Container", &flavor.translate_label(&dir_name));
        let root_range = manifest.add_range(root_range);
        manifest.link_range(top, root_range);

        Self {
            manifest,
            registry: RangeRegistry::new(root, root_range),
            flavor,
            probe,
            ids: ids.clone(),
            top,
            events: None,
            refined: false,
        }
    }

    /// Send diagnostics to `tx` instead of dropping them.
    pub fn with_events(mut self, tx: Sender<BuildEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn emit(&self, event: BuildEvent) {
        if let Some(tx) = &self.events {
            tx.send(event).ok();
        }
    }

    /// Set label, attribution and logo.
    ///
    /// Collection metadata wins over configured fallbacks; the flavor then
    /// adds (or overrides) its own manifest-level description.
    pub fn describe(&mut self, collection: &dyn MetadataSource, defaults: &ManifestConfig) {
        let title = collection.get(Lookup::Title, "");
        let attribution = collection.get(Lookup::Attribution, "");
        self.manifest.label =
            resolve(&[Some(title.as_str()), Some(defaults.label.as_str())]).unwrap_or_default();
        self.manifest.attribution = resolve(&[
            Some(attribution.as_str()),
            Some(defaults.attribution.as_str()),
        ])
        .unwrap_or_default();
        self.manifest.logo = resolve(&[Some(defaults.logo.as_str())]).unwrap_or_default();
        self.flavor.describe_manifest(&mut self.manifest, collection);
    }

    pub fn registry(&self) -> &RangeRegistry {
        &self.registry
    }

    pub fn top_range(&self) -> RangeId {
        self.top
    }

    pub fn root_range(&self) -> RangeId {
        self.registry.root_range()
    }

    pub fn flavor_name(&self) -> &'static str {
        self.flavor.name()
    }

    /// [`get_or_create_range_with`](Self::get_or_create_range_with) without
    /// directory metadata.
    pub fn get_or_create_range(&mut self, dir: &Path) -> RangeId {
        self.get_or_create_range_with(dir, None)
    }

    /// The range for `dir`, creating it (and any missing ancestor below the
    /// walk root) on first request.
    ///
    /// A directory's label is its metadata `Title` when there is one, else
    /// the flavor's translation of its name; the translated name is always
    /// kept as `Container` metadata.
    pub fn get_or_create_range_with(
        &mut self,
        dir: &Path,
        metadata: Option<&dyn MetadataSource>,
    ) -> RangeId {
        if let Some(existing) = self.registry.get(dir) {
            return existing;
        }
        if self.registry.is_below_root(dir)
            && let Some(parent) = dir.parent()
        {
            self.get_or_create_range(parent);
        }

        let raw = file_name(dir);
        let translated = self.flavor.translate_label(&raw);
        let label = metadata
            .map(|m| m.get(Lookup::Title, ""))
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| translated.clone());

        let mut range = Range::new(self.registry.range_id_for(dir), label);
        range.push_metadata("Container", &translated);
        let handle = self.manifest.add_range(range);
        self.registry.register(dir, handle);

        match dir.parent().and_then(|p| self.registry.get(p)) {
            Some(parent) => self.manifest.link_range(parent, handle),
            None => self.emit(BuildEvent::ParentRangeMissing {
                path: dir.to_path_buf(),
            }),
        }

        let created = self.manifest.range(handle);
        self.emit(BuildEvent::RangeCreated {
            id: created.id.clone(),
            label: created.label.clone(),
        });

        let claimed = self.flavor.range_created(&mut self.manifest, handle, &raw);
        for archival in claimed {
            self.emit(BuildEvent::FolderMatched {
                directory: self.manifest.range(handle).id.clone(),
                range: self.manifest.range(archival).id.clone(),
            });
        }
        handle
    }

    /// Build the canvas for one image and place it.
    ///
    /// `key` is the file's path relative to the walk root; it names the
    /// canvas, the image annotation and the Image API service. Returns a copy
    /// of the canvas as constructed.
    pub fn add_canvas(&mut self, key: &str, file: &Path, metadata: &dyn MetadataSource) -> Canvas {
        let key = normalize_key(key);
        let media_path = join_uri(&self.ids.service_root, &key);
        let canvas_id = join_uri(&self.ids.canvas_base, &key);
        let image_id = join_uri(&self.ids.image_base, &key);

        let dimensions = match self.probe.identify(file) {
            Ok(dimensions) => dimensions,
            Err(e) => {
                self.emit(BuildEvent::DimensionFallback {
                    path: file.to_path_buf(),
                    reason: e.to_string(),
                });
                self.flavor.default_dimensions()
            }
        };

        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.clone());
        let label = self.flavor.translate_item_label(&name);
        let image = ImageAnnotation::new(image_id, &self.ids.annotation_on, &media_path, dimensions);
        let mut canvas = Canvas::new(canvas_id.clone(), label, dimensions, image);

        let parent = self.registry.parent_of(file);
        let ctx = CanvasContext {
            parent,
            metadata,
        };
        self.flavor
            .resolve_canvas_metadata(&mut self.manifest, &mut canvas, &ctx);

        let built = canvas.clone();
        self.flavor.place_canvas(&mut self.manifest, canvas);

        match parent {
            Some(parent) => self
                .flavor
                .link_canvas(&mut self.manifest, parent, &canvas_id),
            None => self.emit(BuildEvent::ParentRangeMissing {
                path: file.to_path_buf(),
            }),
        }

        self.emit(BuildEvent::CanvasAdded {
            id: built.id.clone(),
            label: built.label.clone(),
            height: built.height,
            width: built.width,
        });
        built
    }

    /// The linked document, before the flavor's refine step.
    pub fn build(&self) -> &Manifest {
        &self.manifest
    }

    /// Run the flavor's refine step. Calling it again changes nothing.
    pub fn finalize(&mut self) {
        self.flavor.refine(&mut self.manifest);
        if std::mem::replace(&mut self.refined, true) {
            return;
        }
        self.emit(BuildEvent::Refined {
            ranges: self.manifest.ranges().len(),
            canvases: self.manifest.sequence().canvases.len(),
        });
    }

    /// Finalize, then render pretty-printed JSON.
    pub fn finalize_and_serialize(&mut self) -> Result<String, BuildError> {
        self.finalize();
        Ok(serde_json::to_string_pretty(&self.manifest)?)
    }

    /// Finalize, then write the manifest to `target`.
    ///
    /// The document is rendered before the file is touched, so every I/O
    /// failure surfaces as [`BuildError::ManifestFile`] naming `target`.
    pub fn write(&mut self, target: &Path) -> Result<(), BuildError> {
        self.finalize();
        let io_error = |source| BuildError::ManifestFile {
            path: target.to_path_buf(),
            source,
        };
        let json = serde_json::to_vec_pretty(&self.manifest)?;
        let file = File::create(target).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&json).map_err(io_error)?;
        writer.flush().map_err(io_error)?;
        Ok(())
    }

    /// Finalize and hand over the document.
    pub fn into_manifest(mut self) -> Manifest {
        self.finalize();
        self.manifest
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

//! Collection flavors.
//!
//! Every manifest is built by the same pipeline in [`builder`](crate::builder).
//! What differs between a bare directory tree, an archival collection
//! described by a finding aid, a Dublin Core volume and a METS photo
//! collection is captured by one [`Flavor`] strategy object, chosen once per
//! run:
//!
//! | Flavor | Directory labels | Page labels | Extra structure |
//! |--------|------------------|-------------|-----------------|
//! | [`DirectoryFlavor`] | `b7_f12` → "Box 7 Folder 12" | `_item_` prefix stripped | none |
//! | [`EadFlavor`] | same | same | finding-aid components, box/folder cross-filing |
//! | [`DublinCoreFlavor`] | as-is | `vol_0004.tif` → "p. 4" | paged sequence, collection metadata |
//! | [`MetsFlavor`] | as-is | as-is | decade and subject indexes, date-ordered sequence |
//!
//! Hooks receive the [`Manifest`] they act on; flavors own whatever index
//! state they need and fold it in during [`Flavor::refine`].

use crate::document::{Canvas, Manifest, Range, RangeId};
use crate::imaging::{DefaultDimensions, Dimensions};
use crate::index::{DecadeIndex, FolderIndex, FolderMatcher, SubjectIndex};
use crate::metadata::{Lookup, MetadataError, MetadataSource};
use crate::naming::{page_label, strip_item_prefix, translate_box_folder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Which flavor to build with. Selected by `flavor = "..."` in `config.toml`
/// or `--flavor` on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FlavorKind {
    #[default]
    Directory,
    Ead,
    DublinCore,
    Mets,
}

impl FlavorKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Ead => "ead",
            Self::DublinCore => "dublin-core",
            Self::Mets => "mets",
        }
    }
}

/// Everything a flavor may look at while describing one page.
pub struct CanvasContext<'a> {
    /// Range of the directory holding the file, when registered.
    pub parent: Option<RangeId>,
    pub metadata: &'a dyn MetadataSource,
}

/// The lookups written onto every canvas, in output order.
pub const CANVAS_LOOKUPS: [Lookup; 7] = [
    Lookup::Title,
    Lookup::DateCreated,
    Lookup::Creator,
    Lookup::Description,
    Lookup::Subject,
    Lookup::Rights,
    Lookup::Permalink,
];

/// Write the standard descriptive entries onto a canvas. Absent fields are
/// skipped.
pub fn describe_canvas(canvas: &mut Canvas, metadata: &dyn MetadataSource) {
    for lookup in CANVAS_LOOKUPS {
        canvas.push_metadata(lookup.label(), &metadata.get(lookup, ""));
    }
}

/// Per-collection behavior plugged into the manifest builder.
pub trait Flavor {
    fn name(&self) -> &'static str;

    /// Label of the `viewingHint: top` range.
    fn top_label(&self) -> String {
        "Contents".to_string()
    }

    /// Label of the range for the walk root itself.
    fn root_label(&self, dir_name: &str) -> String {
        self.translate_label(dir_name)
    }

    /// One-time setup, run after the top range exists and before the walk
    /// root is registered.
    fn install(&mut self, _manifest: &mut Manifest, _top: RangeId) {}

    /// Manifest-level description from collection metadata.
    fn describe_manifest(&self, _manifest: &mut Manifest, _collection: &dyn MetadataSource) {}

    fn translate_label(&self, label: &str) -> String {
        label.to_string()
    }

    fn translate_item_label(&self, label: &str) -> String {
        label.to_string()
    }

    /// Called once for every new directory range. Returns the ranges that
    /// cross-filed it.
    fn range_created(
        &mut self,
        _manifest: &mut Manifest,
        _range: RangeId,
        _dir_name: &str,
    ) -> Vec<RangeId> {
        Vec::new()
    }

    fn resolve_canvas_metadata(
        &mut self,
        _manifest: &mut Manifest,
        canvas: &mut Canvas,
        ctx: &CanvasContext<'_>,
    ) {
        describe_canvas(canvas, ctx.metadata);
    }

    /// Put a finished canvas into the sequence.
    fn place_canvas(&mut self, manifest: &mut Manifest, canvas: Canvas) {
        manifest.sequence_mut().canvases.push(canvas);
    }

    /// Record a canvas under its directory range.
    fn link_canvas(&mut self, manifest: &mut Manifest, parent: RangeId, canvas_id: &str) {
        manifest.range_mut(parent).add_canvas(canvas_id);
    }

    /// Fold buffered state into the manifest. Must be safe to call twice.
    fn refine(&mut self, _manifest: &mut Manifest) {}

    /// Canvas size when an image cannot be probed.
    fn default_dimensions(&self) -> Dimensions;
}

/// Construct the flavor for a run. The finding aid is only consulted by
/// [`FlavorKind::Ead`].
pub fn make_flavor(
    kind: FlavorKind,
    fallback: DefaultDimensions,
    finding_aid: FindingAid,
) -> Box<dyn Flavor> {
    match kind {
        FlavorKind::Directory => Box::new(DirectoryFlavor::new(fallback)),
        FlavorKind::Ead => Box::new(EadFlavor::new(finding_aid, fallback)),
        FlavorKind::DublinCore => Box::new(DublinCoreFlavor::new(fallback)),
        FlavorKind::Mets => Box::new(MetsFlavor::new(fallback)),
    }
}

// ============================================================================
// Directory
// ============================================================================

/// Plain directory tree with box/folder naming.
#[derive(Debug, Default)]
pub struct DirectoryFlavor {
    fallback: DefaultDimensions,
}

impl DirectoryFlavor {
    pub fn new(fallback: DefaultDimensions) -> Self {
        Self { fallback }
    }
}

impl Flavor for DirectoryFlavor {
    fn name(&self) -> &'static str {
        "directory"
    }

    fn translate_label(&self, label: &str) -> String {
        translate_box_folder(label)
    }

    fn translate_item_label(&self, label: &str) -> String {
        strip_item_prefix(label)
    }

    fn default_dimensions(&self) -> Dimensions {
        self.fallback.dimensions()
    }
}

// ============================================================================
// EAD finding aid
// ============================================================================

/// Archival description read from `finding-aid.toml`.
///
/// ```toml
/// unit_id = "GTM-110"
/// unit_title = "Papers of the Law Center"
///
/// [[component]]
/// id = "ser1"
/// title = "Correspondence"
/// level = "series"
///
///   [[component.component]]
///   id = "ser1-f1"
///   title = "Letters, 1950-1955"
///   level = "file"
///   box = "1"
///   folder = "1-3"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FindingAid {
    pub unit_id: String,
    pub unit_title: String,
    #[serde(rename = "component")]
    pub components: Vec<Component>,
}

/// One described unit (series, subseries, file...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Component {
    pub id: String,
    pub title: String,
    pub level: String,
    #[serde(rename = "box")]
    pub box_number: String,
    pub folder: String,
    #[serde(rename = "component")]
    pub components: Vec<Component>,
}

impl FindingAid {
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let content =
            fs::read_to_string(path).map_err(|e| MetadataError::Io(path.to_path_buf(), e))?;
        toml::from_str(&content).map_err(|e| MetadataError::Toml(path.to_path_buf(), e))
    }

    /// `"<unit id>: <unit title>"`, or whichever half exists.
    pub fn label(&self) -> String {
        let id = self.unit_id.trim();
        let title = self.unit_title.trim();
        match (id.is_empty(), title.is_empty()) {
            (false, false) => format!("{id}: {title}"),
            (false, true) => id.to_string(),
            (true, false) => title.to_string(),
            (true, true) => String::new(),
        }
    }
}

impl Component {
    /// `Container` metadata value: `"Box 3"` or `"Box 3; Folder 1-4"`.
    /// Empty when no box is recorded.
    pub fn container(&self) -> String {
        match (self.box_number.trim(), self.folder.trim()) {
            ("", _) => String::new(),
            (b, "") => format!("Box {b}"),
            (b, f) => format!("Box {b}; Folder {f}"),
        }
    }
}

/// Archival collection: finding-aid components over a box/folder tree.
#[derive(Debug)]
pub struct EadFlavor {
    finding_aid: FindingAid,
    matcher: FolderMatcher,
    fallback: DefaultDimensions,
}

impl EadFlavor {
    pub fn new(finding_aid: FindingAid, fallback: DefaultDimensions) -> Self {
        Self {
            finding_aid,
            matcher: FolderMatcher::new(),
            fallback,
        }
    }

    pub fn matcher(&self) -> &FolderMatcher {
        &self.matcher
    }

    fn install_components(
        &mut self,
        manifest: &mut Manifest,
        parent: RangeId,
        components: &[Component],
    ) {
        for component in components {
            let id = if component.id.trim().is_empty() {
                format!("component-{}", manifest.ranges().len())
            } else {
                component.id.trim().to_string()
            };
            let label = if component.title.trim().is_empty() {
                id.clone()
            } else {
                component.title.trim().to_string()
            };

            let mut range = Range::new(id, label);
            range.push_metadata("level", component.level.trim());
            let container = component.container();
            range.push_metadata("Container", &container);
            let handle = manifest.add_range(range);
            manifest.link_range(parent, handle);

            if !container.is_empty() {
                self.matcher.register(
                    FolderIndex::new(component.box_number.trim(), component.folder.trim()),
                    handle,
                );
            }
            self.install_components(manifest, handle, &component.components);
        }
    }
}

impl Flavor for EadFlavor {
    fn name(&self) -> &'static str {
        "ead"
    }

    fn top_label(&self) -> String {
        "Finding Aid".to_string()
    }

    fn root_label(&self, _dir_name: &str) -> String {
        "All Boxes and Folders".to_string()
    }

    fn install(&mut self, manifest: &mut Manifest, top: RangeId) {
        let components = std::mem::take(&mut self.finding_aid.components);
        self.install_components(manifest, top, &components);
        self.finding_aid.components = components;
    }

    fn describe_manifest(&self, manifest: &mut Manifest, _collection: &dyn MetadataSource) {
        let label = self.finding_aid.label();
        if !label.is_empty() {
            manifest.label = label;
        }
    }

    fn translate_label(&self, label: &str) -> String {
        translate_box_folder(label)
    }

    fn translate_item_label(&self, label: &str) -> String {
        strip_item_prefix(label)
    }

    fn range_created(
        &mut self,
        manifest: &mut Manifest,
        range: RangeId,
        dir_name: &str,
    ) -> Vec<RangeId> {
        let claimed = self.matcher.claim(dir_name);
        for &component in &claimed {
            manifest.link_range_once(component, range);
        }
        claimed
    }

    fn default_dimensions(&self) -> Dimensions {
        self.fallback.dimensions()
    }
}

// ============================================================================
// Dublin Core
// ============================================================================

/// A bound volume described by Dublin Core: paged viewing, numbered pages.
#[derive(Debug, Default)]
pub struct DublinCoreFlavor {
    fallback: DefaultDimensions,
}

impl DublinCoreFlavor {
    pub fn new(fallback: DefaultDimensions) -> Self {
        Self { fallback }
    }
}

impl Flavor for DublinCoreFlavor {
    fn name(&self) -> &'static str {
        "dublin-core"
    }

    fn install(&mut self, manifest: &mut Manifest, _top: RangeId) {
        manifest.sequence_mut().viewing_hint = Some("paged".to_string());
    }

    fn describe_manifest(&self, manifest: &mut Manifest, collection: &dyn MetadataSource) {
        manifest.description = collection.get(Lookup::Description, "");
        manifest.push_metadata("Creator", &collection.get(Lookup::Creator, ""));
        manifest.push_metadata("Publisher", &collection.get(Lookup::Publisher, ""));
        manifest.push_metadata("Date Created", &collection.get(Lookup::DateCreated, ""));
        manifest.push_metadata(
            Lookup::Identifier.label(),
            &collection.get(Lookup::Identifier, ""),
        );
        manifest.push_metadata(Lookup::Subject.label(), &collection.get(Lookup::Subject, ""));
    }

    fn translate_item_label(&self, label: &str) -> String {
        page_label(label)
    }

    fn default_dimensions(&self) -> Dimensions {
        self.fallback.dimensions()
    }
}

// ============================================================================
// METS photo collection
// ============================================================================

/// Photo collection browsed by decade and by subject.
///
/// Canvases are held back during the walk and written into the sequence at
/// refine time, ordered by creation date.
#[derive(Debug, Default)]
pub struct MetsFlavor {
    fallback: DefaultDimensions,
    decades: DecadeIndex,
    subjects: SubjectIndex,
    listings: Option<(RangeId, RangeId)>,
    pending: BTreeMap<String, Canvas>,
}

impl MetsFlavor {
    pub fn new(fallback: DefaultDimensions) -> Self {
        Self {
            fallback,
            ..Self::default()
        }
    }

    pub fn decades(&self) -> &DecadeIndex {
        &self.decades
    }

    pub fn subjects(&self) -> &SubjectIndex {
        &self.subjects
    }

    /// Canvases not yet written to the sequence.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl Flavor for MetsFlavor {
    fn name(&self) -> &'static str {
        "mets"
    }

    fn install(&mut self, manifest: &mut Manifest, top: RangeId) {
        let dates = manifest.add_range(Range::new("date-ranges", "Date Ranges"));
        manifest.link_range(top, dates);
        let subjects = manifest.add_range(Range::new("all-subjects", "All Subjects"));
        manifest.link_range(top, subjects);
        self.listings = Some((dates, subjects));
    }

    fn resolve_canvas_metadata(
        &mut self,
        manifest: &mut Manifest,
        canvas: &mut Canvas,
        ctx: &CanvasContext<'_>,
    ) {
        let meta = ctx.metadata;
        for lookup in CANVAS_LOOKUPS {
            let value = meta.get(lookup, "");
            if lookup == Lookup::Permalink && !value.is_empty() {
                canvas.push_metadata(lookup.label(), &format!("<a href='{value}'>{value}</a>"));
            } else {
                canvas.push_metadata(lookup.label(), &value);
            }
        }

        let date = meta.get(Lookup::DateCreated, "");
        self.decades.route(manifest, &date, &canvas.id);

        if let Some(parent) = ctx.parent {
            for subject in meta.values(Lookup::Subject) {
                self.subjects.route(manifest, &subject, parent);
            }
        }
    }

    fn place_canvas(&mut self, _manifest: &mut Manifest, canvas: Canvas) {
        let date = canvas
            .metadata_value(Lookup::DateCreated.label())
            .unwrap_or_default();
        let key = format!("{} {}", date, canvas.id);
        self.pending.insert(key, canvas);
    }

    fn refine(&mut self, manifest: &mut Manifest) {
        let pending = std::mem::take(&mut self.pending);
        manifest.sequence_mut().canvases.extend(pending.into_values());
        if let Some((dates, subjects)) = self.listings {
            self.decades.finalize(manifest, dates);
            self.subjects.finalize(manifest, subjects);
        }
    }

    fn default_dimensions(&self) -> Dimensions {
        self.fallback.dimensions()
    }
}

//! Directory → range cache.
//!
//! The registry is the single answer to "has this directory already been
//! materialized?". It is owned by one [`ManifestBuilder`](crate::builder::ManifestBuilder)
//! and lives exactly as long as that build. Entries are insert-once: a path
//! that is already registered keeps its original range forever.
//!
//! Keys are paths as given by the caller; the walk root is registered first,
//! so any directory strictly below it can be resolved by walking up.

use crate::document::RangeId;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

#[derive(Debug)]
pub struct RangeRegistry {
    root: PathBuf,
    root_range: RangeId,
    ranges: HashMap<PathBuf, RangeId>,
}

impl RangeRegistry {
    /// Start a registry with the walk root already materialized.
    pub fn new(root: impl Into<PathBuf>, root_range: RangeId) -> Self {
        let root = root.into();
        let mut ranges = HashMap::new();
        ranges.insert(root.clone(), root_range);
        Self {
            root,
            root_range,
            ranges,
        }
    }

    pub fn root_range(&self) -> RangeId {
        self.root_range
    }

    pub fn get(&self, dir: &Path) -> Option<RangeId> {
        self.ranges.get(dir).copied()
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.ranges.contains_key(dir)
    }

    /// Register `dir`. Returns `false` (and changes nothing) when the path is
    /// already taken.
    pub fn register(&mut self, dir: &Path, range: RangeId) -> bool {
        if self.ranges.contains_key(dir) {
            return false;
        }
        self.ranges.insert(dir.to_path_buf(), range);
        true
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// True when `dir` lies strictly below the walk root.
    pub fn is_below_root(&self, dir: &Path) -> bool {
        dir != self.root && dir.starts_with(&self.root)
    }

    /// Range of the directory containing `file`, if that directory is known.
    pub fn parent_of(&self, file: &Path) -> Option<RangeId> {
        file.parent().and_then(|dir| self.get(dir))
    }

    /// Stable range `@id` for a directory: its path relative to the walk
    /// root, `/`-separated. Directories outside the root keep the path as
    /// given.
    pub fn range_id_for(&self, dir: &Path) -> String {
        let relative = dir.strip_prefix(&self.root).unwrap_or(dir);
        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                Component::RootDir | Component::Prefix(_) | Component::CurDir => None,
                Component::ParentDir => Some("..".to_string()),
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Manifest, Range};

    fn registry() -> (Manifest, RangeRegistry) {
        let mut manifest = Manifest::new("urn:m", "urn:seq");
        let root = manifest.add_range(Range::new("file-system", "root"));
        (manifest, RangeRegistry::new("/data/root", root))
    }

    #[test]
    fn root_is_registered_up_front() {
        let (_, registry) = registry();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(Path::new("/data/root")),
            Some(registry.root_range())
        );
    }

    #[test]
    fn register_is_insert_once() {
        let (mut manifest, mut registry) = registry();
        let first = manifest.add_range(Range::new("a", "A"));
        let second = manifest.add_range(Range::new("b", "B"));
        let dir = Path::new("/data/root/box_1");

        assert!(registry.register(dir, first));
        assert!(!registry.register(dir, second));
        assert_eq!(registry.get(dir), Some(first));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn below_root_excludes_root_and_outsiders() {
        let (_, registry) = registry();
        assert!(registry.is_below_root(Path::new("/data/root/box_1")));
        assert!(!registry.is_below_root(Path::new("/data/root")));
        assert!(!registry.is_below_root(Path::new("/data/other")));
        assert!(!registry.is_below_root(Path::new("/data/rootless")));
    }

    #[test]
    fn range_ids_are_root_relative() {
        let (_, registry) = registry();
        assert_eq!(
            registry.range_id_for(Path::new("/data/root/box_1/folder_1-2")),
            "box_1/folder_1-2"
        );
        assert_eq!(registry.range_id_for(Path::new("/elsewhere/x")), "elsewhere/x");
    }

    #[test]
    fn parent_of_file() {
        let (_, registry) = registry();
        assert_eq!(
            registry.parent_of(Path::new("/data/root/img.jpg")),
            Some(registry.root_range())
        );
        assert_eq!(registry.parent_of(Path::new("/data/root/box_9/img.jpg")), None);
    }
}

//! Secondary indexes: extra range trees that cross-file pages and folders.
//!
//! The directory tree gives every page one structural parent. Collections
//! usually want more than one way in:
//!
//! | Index | Keyed by | Members |
//! |-------|----------|---------|
//! | [`FolderMatcher`] | archival box + folder span | directory ranges named `b<box>_f<folder>` |
//! | [`DecadeIndex`] | decade of the creation date | canvases |
//! | [`SubjectIndex`] | subject heading | directory ranges holding a page with that subject |
//!
//! Each index owns a bucket → [`RangeId`] map and creates a bucket's range on
//! first use. Members are recorded as `@id` references, so a page or folder
//! filed under a decade or subject still has exactly one owner.
//!
//! `finalize` on the decade and subject indexes may run more than once
//! without duplicating anything: labels are recomputed from the bucket name
//! and listing links are only added when missing.

use crate::document::{Manifest, Range, RangeId};
use std::collections::BTreeMap;

// ============================================================================
// Box / folder matching
// ============================================================================

/// Normalized archival container: one box and an inclusive folder span.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderIndex {
    box_number: String,
    folder_start: String,
    folder_end: String,
}

impl FolderIndex {
    /// Build from finding-aid container values.
    ///
    /// `folder` is either a single folder (`"3"`) or a span (`"3-5"`, split
    /// at the last `-`).
    pub fn new(box_number: &str, folder: &str) -> Self {
        let (start, end) = folder.rsplit_once('-').unwrap_or((folder, folder));
        Self {
            box_number: Self::normalize(box_number),
            folder_start: Self::normalize(start),
            folder_end: Self::normalize(end),
        }
    }

    /// Zero-pad a numeric token to 6 digits; other tokens pass through.
    ///
    /// Padding makes string comparison agree with numeric order:
    /// `"7"` → `"000007"`, `"007"` → `"000007"`, `"12a"` → `"12a"`.
    pub fn normalize(token: &str) -> String {
        match token.parse::<i32>() {
            Ok(n) => format!("{n:06}"),
            Err(_) => token.to_string(),
        }
    }

    /// Does a `b<box>_f<folder>` directory name fall inside this container?
    pub fn contains_directory(&self, dir_name: &str) -> bool {
        let Some((box_part, folder_part)) = dir_name
            .strip_prefix('b')
            .and_then(|rest| rest.rsplit_once("_f"))
        else {
            return false;
        };
        if Self::normalize(box_part) != self.box_number {
            return false;
        }
        let folder = Self::normalize(folder_part);
        folder >= self.folder_start && folder <= self.folder_end
    }
}

/// Archival ranges keyed by their [`FolderIndex`], in registration order.
#[derive(Debug, Default)]
pub struct FolderMatcher {
    entries: Vec<(FolderIndex, RangeId)>,
}

impl FolderMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, index: FolderIndex, range: RangeId) {
        self.entries.push((index, range));
    }

    /// Every archival range whose container holds the named directory.
    pub fn claim(&self, dir_name: &str) -> Vec<RangeId> {
        self.entries
            .iter()
            .filter(|(index, _)| index.contains_directory(dir_name))
            .map(|(_, range)| *range)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Decade buckets
// ============================================================================

/// Bucket label for a creation date.
///
/// Dates starting with four digits bucket by decade; anything else is
/// `"Unspecified"`. Only the leading digits are inspected, so `"19870615"`,
/// `"1987-06-15"` and `"1987?"` all land in `"1980 - 1990"`.
pub fn decade_label(date: &str) -> String {
    let bytes = date.as_bytes();
    if bytes.len() >= 4 && bytes[..4].iter().all(u8::is_ascii_digit) {
        // Four ASCII digits, so this slice and parse cannot fail.
        if let Ok(decade) = date[..3].parse::<u32>() {
            return format!("{}0 - {}0", decade, decade + 1);
        }
    }
    "Unspecified".to_string()
}

/// Canvases grouped by decade.
#[derive(Debug, Default)]
pub struct DecadeIndex {
    buckets: BTreeMap<String, RangeId>,
}

impl DecadeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a canvas under the decade of `date`, creating the bucket range
    /// on first use. Returns the bucket.
    pub fn route(&mut self, manifest: &mut Manifest, date: &str, canvas_id: &str) -> RangeId {
        let name = decade_label(date);
        let bucket = *self.buckets.entry(name).or_insert_with_key(|name| {
            let id = format!("date-{}", name.replace(' ', ""));
            manifest.add_range(Range::new(id, name.clone()))
        });
        manifest.range_mut(bucket).add_canvas(canvas_id);
        bucket
    }

    pub fn bucket(&self, name: &str) -> Option<RangeId> {
        self.buckets.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Append canvas counts to bucket labels (`"1980 - 1990 (42)"`) and list
    /// every bucket, in label order, under `listing`.
    pub fn finalize(&self, manifest: &mut Manifest, listing: RangeId) {
        for (name, &bucket) in &self.buckets {
            let range = manifest.range_mut(bucket);
            range.label = format!("{} ({})", name, range.canvases.len());
            manifest.link_range_once(listing, bucket);
        }
    }
}

// ============================================================================
// Subject buckets
// ============================================================================

/// Directory ranges grouped by subject heading.
#[derive(Debug, Default)]
pub struct SubjectIndex {
    subjects: BTreeMap<String, RangeId>,
}

impl SubjectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cross-reference `member` (a directory range) under `subject`.
    ///
    /// Blank subjects are ignored. A member is listed at most once per subject.
    pub fn route(&mut self, manifest: &mut Manifest, subject: &str, member: RangeId) {
        let subject = subject.trim();
        if subject.is_empty() {
            return;
        }
        let bucket = *self
            .subjects
            .entry(subject.to_string())
            .or_insert_with_key(|subject| {
                manifest.add_range(Range::new(subject.replace(' ', ""), subject.clone()))
            });
        manifest.link_range_once(bucket, member);
    }

    pub fn bucket(&self, subject: &str) -> Option<RangeId> {
        self.subjects.get(subject).copied()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// List every subject range, alphabetically, under `listing`.
    pub fn finalize(&self, manifest: &mut Manifest, listing: RangeId) {
        for &bucket in self.subjects.values() {
            manifest.link_range_once(listing, bucket);
        }
    }
}

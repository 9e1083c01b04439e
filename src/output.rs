//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every range is shown by its label, with its `@id` and canvas count as
//! secondary context. The output reads as an inventory of the collection
//! while still letting users trace each entry back to a directory.
//!
//! # Output Format
//!
//! ## Build events
//!
//! ```text
//! Range box_1 → Box 1
//! Canvas img001.jpg (1536 x 2048)
//! warning: box_9/img.jpg: no parent range, not linked
//! ```
//!
//! ## Manifest tree
//!
//! ```text
//! Contents
//!     001 Box 1 (2 canvases)
//!         Id: box_1
//!         001 Box 1 Folder 3 (1 canvas)
//!             Id: box_1/b1_f3
//!
//! Built directory manifest: 2 directories, 3 canvases
//! ```
//!
//! A range cross-filed under several parents is expanded once; later
//! occurrences show `(see above)`.
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::builder::BuildEvent;
use crate::document::{Manifest, Range};
use crate::scan::BuildReport;
use std::collections::HashSet;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Format a range header: positional index + label, with canvas count when
/// the range holds canvases directly.
///
/// ```text
/// 001 Box 1 (5 canvases)
/// 002 1990s
/// ```
fn range_header(index: usize, range: &Range) -> String {
    let label = if range.label.is_empty() {
        format!("({})", range.id)
    } else {
        range.label.clone()
    };
    match range.canvases.len() {
        0 => format!("{} {}", format_index(index), label),
        n => format!(
            "{} {} ({})",
            format_index(index),
            label,
            plural(n, "canvas", "canvases")
        ),
    }
}

// ============================================================================
// Build events
// ============================================================================

/// Format a single build event as display lines.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::RangeCreated { id, label } => vec![format!("Range {id} → {label}")],
        BuildEvent::CanvasAdded {
            label,
            height,
            width,
            ..
        } => vec![format!("Canvas {label} ({height} x {width})")],
        BuildEvent::ParentRangeMissing { path } => vec![format!(
            "warning: {}: no parent range, not linked",
            path.display()
        )],
        BuildEvent::DimensionFallback { path, reason } => vec![
            format!("warning: {}: using fallback size", path.display()),
            format!("    {reason}"),
        ],
        BuildEvent::MetadataUnreadable { path, reason } => vec![
            format!("warning: {}: metadata ignored", path.display()),
            format!("    {reason}"),
        ],
        BuildEvent::FolderMatched { directory, range } => {
            vec![format!("Filed {directory} under {range}")]
        }
        BuildEvent::Refined { ranges, canvases } => vec![format!(
            "Finalized {} and {}",
            plural(*ranges, "range", "ranges"),
            plural(*canvases, "canvas", "canvases")
        )],
    }
}

/// Print one build event to stdout.
pub fn print_build_event(event: &BuildEvent) {
    for line in format_build_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Manifest tree
// ============================================================================

/// Format the range tree below the `viewingHint: top` range, followed by a
/// one-line summary.
pub fn format_manifest_tree(report: &BuildReport) -> Vec<String> {
    let manifest = &report.manifest;
    let mut lines = Vec::new();

    if !manifest.label.is_empty() {
        lines.push(manifest.label.clone());
        lines.push(String::new());
    }

    if let Some(top) = manifest
        .ranges()
        .iter()
        .find(|r| r.viewing_hint.as_deref() == Some("top"))
    {
        lines.push(top.label.clone());
        let mut seen = HashSet::new();
        seen.insert(top.id.as_str());
        walk_ranges(manifest, top, 1, &mut seen, &mut lines);
    }

    lines.push(String::new());
    lines.push(format_summary(report));
    lines
}

fn walk_ranges<'a>(
    manifest: &'a Manifest,
    parent: &'a Range,
    depth: usize,
    seen: &mut HashSet<&'a str>,
    lines: &mut Vec<String>,
) {
    for (i, child_id) in parent.ranges.iter().enumerate() {
        let Some(handle) = manifest.find_range(child_id) else {
            continue;
        };
        let child = manifest.range(handle);
        let base = indent(depth);
        if !seen.insert(child.id.as_str()) {
            lines.push(format!(
                "{}{} (see above)",
                base,
                range_header(i + 1, child)
            ));
            continue;
        }
        lines.push(format!("{}{}", base, range_header(i + 1, child)));
        lines.push(format!("{}    Id: {}", base, child.id));
        walk_ranges(manifest, child, depth + 1, seen, lines);
    }
}

/// One-line build summary.
pub fn format_summary(report: &BuildReport) -> String {
    let mut summary = format!(
        "Built {} manifest: {}, {}",
        report.flavor,
        plural(report.directories, "directory", "directories"),
        plural(report.canvases, "canvas", "canvases")
    );
    if report.skipped > 0 {
        summary.push_str(&format!(" ({} skipped)", plural(report.skipped, "file", "files")));
    }
    summary
}

/// Print the manifest tree to stdout.
pub fn print_manifest_tree(report: &BuildReport) {
    for line in format_manifest_tree(report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn report(manifest: Manifest) -> BuildReport {
        let canvases = manifest.sequence().canvases.len();
        BuildReport {
            manifest,
            flavor: "directory",
            directories: 2,
            canvases,
            skipped: 0,
        }
    }

    #[test]
    fn format_index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(999), "999");
    }

    #[test]
    fn indent_is_four_spaces_per_level() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn range_header_with_canvases() {
        let mut range = Range::new("box_1", "Box 1");
        range.add_canvas("c1");
        range.add_canvas("c2");
        assert_eq!(range_header(1, &range), "001 Box 1 (2 canvases)");

        let mut single = Range::new("box_2", "Box 2");
        single.add_canvas("c3");
        assert_eq!(range_header(2, &single), "002 Box 2 (1 canvas)");
    }

    #[test]
    fn range_header_without_label_shows_id() {
        let range = Range::new("date-1990s", "");
        assert_eq!(range_header(3, &range), "003 (date-1990s)");
    }

    #[test]
    fn format_range_created_event() {
        let event = BuildEvent::RangeCreated {
            id: "box_1".into(),
            label: "Box 1".into(),
        };
        assert_eq!(format_build_event(&event), vec!["Range box_1 → Box 1"]);
    }

    #[test]
    fn format_canvas_added_event() {
        let event = BuildEvent::CanvasAdded {
            id: "urn:c".into(),
            label: "img001.jpg".into(),
            height: 1536,
            width: 2048,
        };
        assert_eq!(
            format_build_event(&event),
            vec!["Canvas img001.jpg (1536 x 2048)"]
        );
    }

    #[test]
    fn format_warning_events_carry_reason() {
        let event = BuildEvent::DimensionFallback {
            path: PathBuf::from("box_1/broken.jpg"),
            reason: "bad header".into(),
        };
        assert_eq!(
            format_build_event(&event),
            vec![
                "warning: box_1/broken.jpg: using fallback size",
                "    bad header"
            ]
        );

        let event = BuildEvent::ParentRangeMissing {
            path: PathBuf::from("elsewhere/img.jpg"),
        };
        assert_eq!(
            format_build_event(&event),
            vec!["warning: elsewhere/img.jpg: no parent range, not linked"]
        );
    }

    #[test]
    fn format_refined_event() {
        let event = BuildEvent::Refined {
            ranges: 1,
            canvases: 3,
        };
        assert_eq!(
            format_build_event(&event),
            vec!["Finalized 1 range and 3 canvases"]
        );
    }

    #[test]
    fn manifest_tree_walks_from_top() {
        let mut manifest = Manifest::new("urn:m", "urn:seq");
        manifest.label = "Papers".into();
        let top = manifest.add_range(Range::new("top", "Contents").with_viewing_hint("top"));
        let root = manifest.add_range(Range::new("file-system", "All Files"));
        let mut box_range = Range::new("box_1", "Box 1");
        box_range.add_canvas("c1");
        let box_1 = manifest.add_range(box_range);
        manifest.link_range(top, root);
        manifest.link_range(root, box_1);

        let lines = format_manifest_tree(&report(manifest));
        assert_eq!(
            lines,
            vec![
                "Papers",
                "",
                "Contents",
                "    001 All Files",
                "        Id: file-system",
                "        001 Box 1 (1 canvas)",
                "            Id: box_1",
                "",
                "Built directory manifest: 2 directories, 0 canvases",
            ]
        );
    }

    #[test]
    fn cross_filed_range_is_expanded_once() {
        let mut manifest = Manifest::new("urn:m", "urn:seq");
        let top = manifest.add_range(Range::new("top", "Finding Aid").with_viewing_hint("top"));
        let series = manifest.add_range(Range::new("s1", "Series 1"));
        let folder = manifest.add_range(Range::new("box_1/b1_f3", "Box 1 Folder 3"));
        manifest.link_range(top, series);
        manifest.link_range(top, folder);
        manifest.link_range(series, folder);

        let lines = format_manifest_tree(&report(manifest));
        assert!(lines.contains(&"        001 Box 1 Folder 3".to_string()));
        assert!(lines.contains(&"    002 Box 1 Folder 3 (see above)".to_string()));
    }

    #[test]
    fn summary_mentions_skipped_files() {
        let mut r = report(Manifest::new("urn:m", "urn:seq"));
        r.skipped = 1;
        r.directories = 1;
        assert_eq!(
            format_summary(&r),
            "Built directory manifest: 1 directory, 0 canvases (1 file skipped)"
        );
    }
}

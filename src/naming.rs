//! Label and identifier conventions.
//!
//! Scanning projects encode structure in directory and file names. The
//! helpers here turn those names into display labels and publication paths:
//!
//! - `box_3/` → "Box 3", `b7_f12/` → "Box 7 Folder 12" (archival containers)
//! - `ms0042_item_017.jpg` → "017.jpg" (item prefix stripped)
//! - `hoya_1950_0004.tif` → "p. 4" (page number)
//! - `box_1\folder_2\img.jpg` → `box_1/folder_2/img.jpg` (publication key)

/// Translate archival container names into "Box N Folder M" wording.
///
/// Applied in order: every `box_` becomes `Box `, a leading lowercase `b`
/// becomes `Box `, and every `_f` becomes ` Folder `.
///
/// - `"box_3"` → `"Box 3"`
/// - `"b7_f12"` → `"Box 7 Folder 12"`
/// - `"folder_1-2"` → `"folder_1-2"` (unchanged)
pub fn translate_box_folder(label: &str) -> String {
    let label = label.replace("box_", "Box ");
    let label = match label.strip_prefix('b') {
        Some(rest) => format!("Box {rest}"),
        None => label,
    };
    label.replace("_f", " Folder ")
}

/// Strip everything up to and including the last `_item_`.
///
/// - `"ms0042_item_017.jpg"` → `"017.jpg"`
/// - `"img001.jpg"` → `"img001.jpg"`
pub fn strip_item_prefix(label: &str) -> String {
    match label.rfind("_item_") {
        Some(pos) => label[pos + "_item_".len()..].to_string(),
        None => label.to_string(),
    }
}

/// Render `<anything>_<digits>.tif` as a page label.
///
/// - `"hoya_1950_0004.tif"` → `"p. 4"`
/// - `"cover.tif"` → `"cover.tif"` (no page number)
/// - `"hoya_0004.jpg"` → `"hoya_0004.jpg"` (only TIFF masters are numbered)
pub fn page_label(label: &str) -> String {
    let page = label
        .strip_suffix(".tif")
        .and_then(|stem| stem.rsplit_once('_'))
        .map(|(_, digits)| digits)
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<i32>().ok());
    match page {
        Some(n) => format!("p. {n}"),
        None => label.to_string(),
    }
}

/// Normalize a relative file key for publication: backslashes become
/// forward slashes and leading separators are dropped.
pub fn normalize_key(key: &str) -> String {
    key.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Join a base URI and a relative path with exactly one `/`.
pub fn join_uri(base: &str, tail: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), tail)
}

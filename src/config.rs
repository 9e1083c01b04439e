//! Collection configuration.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the source root next to the scanned tree and is optional: every key has a
//! stock default, and a user file only needs the values it changes.
//!
//! ## Config File Location
//!
//! ```text
//! collection/
//! ├── config.toml              # Build config (overrides stock defaults)
//! ├── metadata.toml            # Collection metadata
//! ├── finding-aid.toml         # Archival description (ead flavor)
//! └── box_1/
//!     └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! flavor = "directory"              # directory | ead | dublin-core | mets
//! output = "manifest.json"          # Relative to the source root
//! finding_aid = "finding-aid.toml"  # Relative to the source root
//!
//! [ids]
//! manifest = "https://iiif.example.org/manifest"
//! sequence = "https://iiif.example.org/sequence/normal"
//! canvas_base = "https://iiif.example.org/canvas"
//! image_base = "https://iiif.example.org/annotation"
//! annotation_on = "https://iiif.example.org/manifest"
//! service_root = "https://iiif.example.org/iiif/2"
//! top_range = "top"
//! root_range = "file-system"
//!
//! [manifest]
//! label = ""                        # Used when the collection has no title
//! attribution = ""                  # Used when the collection has no attribution
//! logo = ""
//!
//! [dimensions]
//! fallback = "portrait"             # portrait (1000x700) | landscape (750x1000)
//!
//! [scan]
//! extensions = ["jpg", "jpeg", "tif", "tiff", "png", "webp", "avif"]
//! ```
//!
//! ## Partial Configuration
//!
//! User files are merged key-by-key over the stock defaults, so
//!
//! ```toml
//! [ids]
//! service_root = "https://images.library.example.edu/iiif/2"
//! ```
//!
//! changes only the Image API root and keeps every other default.
//!
//! ## Validation
//!
//! Unknown keys are rejected. Every `[ids]` entry, `output` and
//! `scan.extensions` must be non-empty.

use crate::flavor::FlavorKind;
use crate::imaging::DefaultDimensions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of the build configuration inside the source root.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Build configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectionConfig {
    /// Collection flavor driving labels and extra structure.
    pub flavor: FlavorKind,
    /// Manifest file name, relative to the source root.
    pub output: String,
    /// Finding aid file name, relative to the source root.
    pub finding_aid: String,
    /// Identifiers minted into the manifest.
    pub ids: IdsConfig,
    /// Manifest-level fallbacks.
    pub manifest: ManifestConfig,
    /// Canvas size for unreadable images.
    pub dimensions: DimensionsConfig,
    /// Which files are pages.
    pub scan: ScanConfig,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            flavor: FlavorKind::default(),
            output: "manifest.json".to_string(),
            finding_aid: "finding-aid.toml".to_string(),
            ids: IdsConfig::default(),
            manifest: ManifestConfig::default(),
            dimensions: DimensionsConfig::default(),
            scan: ScanConfig::default(),
        }
    }
}

impl CollectionConfig {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.trim().is_empty() {
            return Err(ConfigError::Validation("output must not be empty".into()));
        }
        for (key, value) in self.ids.entries() {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "ids.{key} must not be empty"
                )));
            }
        }
        if self.scan.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "scan.extensions must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Identifiers and URI prefixes.
///
/// Canvas, image and service ids are `<base>/<relative path of the file>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdsConfig {
    pub manifest: String,
    pub sequence: String,
    pub canvas_base: String,
    pub image_base: String,
    /// Target of every image annotation's `on`.
    pub annotation_on: String,
    /// IIIF Image API root; a page's service is `<service_root>/<path>`.
    pub service_root: String,
    pub top_range: String,
    pub root_range: String,
}

impl Default for IdsConfig {
    fn default() -> Self {
        Self {
            manifest: "https://iiif.example.org/manifest".to_string(),
            sequence: "https://iiif.example.org/sequence/normal".to_string(),
            canvas_base: "https://iiif.example.org/canvas".to_string(),
            image_base: "https://iiif.example.org/annotation".to_string(),
            annotation_on: "https://iiif.example.org/manifest".to_string(),
            service_root: "https://iiif.example.org/iiif/2".to_string(),
            top_range: "top".to_string(),
            root_range: "file-system".to_string(),
        }
    }
}

impl IdsConfig {
    fn entries(&self) -> [(&'static str, &str); 8] {
        [
            ("manifest", self.manifest.as_str()),
            ("sequence", self.sequence.as_str()),
            ("canvas_base", self.canvas_base.as_str()),
            ("image_base", self.image_base.as_str()),
            ("annotation_on", self.annotation_on.as_str()),
            ("service_root", self.service_root.as_str()),
            ("top_range", self.top_range.as_str()),
            ("root_range", self.root_range.as_str()),
        ]
    }
}

/// Fallbacks for manifest-level fields the collection metadata lacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    pub label: String,
    pub attribution: String,
    pub logo: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DimensionsConfig {
    pub fallback: DefaultDimensions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Page file extensions, matched case-insensitively.
    pub extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: ["jpg", "jpeg", "tif", "tiff", "png", "webp", "avif"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

impl ScanConfig {
    pub fn is_page(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.trim().eq_ignore_ascii_case(ext))
            })
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(CollectionConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<CollectionConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: CollectionConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<CollectionConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# IIIF Builder Configuration
# ==========================
#
# Place this file as config.toml in the root of the tree to scan.
# All options are optional. Uncomment and change only what you need;
# everything else keeps the defaults shown here.
# Unknown keys are rejected.

# Collection flavor:
#   directory    plain folder tree; "box_3" -> "Box 3", "b7_f12" -> "Box 7 Folder 12"
#   ead          directory tree plus finding-aid components (see finding_aid)
#   dublin-core  paged volume; "vol_0004.tif" -> "p. 4"
#   mets         photo collection browsed by decade and by subject
# flavor = "directory"

# Manifest file written by `build`, relative to the source root.
# output = "manifest.json"

# Finding aid read by the ead flavor, relative to the source root.
# finding_aid = "finding-aid.toml"

# ---------------------------------------------------------------------------
# Identifiers
# ---------------------------------------------------------------------------
# Canvas, image and service ids are "<base>/<relative path of the file>".
[ids]
# manifest = "https://iiif.example.org/manifest"
# sequence = "https://iiif.example.org/sequence/normal"
# canvas_base = "https://iiif.example.org/canvas"
# image_base = "https://iiif.example.org/annotation"
# annotation_on = "https://iiif.example.org/manifest"

# Root of the IIIF Image API server publishing the page images.
# service_root = "https://iiif.example.org/iiif/2"

# Range ids of the top range and of the range for the scanned root.
# top_range = "top"
# root_range = "file-system"

# ---------------------------------------------------------------------------
# Manifest
# ---------------------------------------------------------------------------
# Used when metadata.toml in the source root has no title / attribution.
[manifest]
# label = ""
# attribution = ""
# logo = ""

# ---------------------------------------------------------------------------
# Dimensions
# ---------------------------------------------------------------------------
# Canvas size for images whose dimensions cannot be read.
#   portrait   1000 high x 700 wide
#   landscape  750 high x 1000 wide
[dimensions]
# fallback = "portrait"

# ---------------------------------------------------------------------------
# Scan
# ---------------------------------------------------------------------------
# File extensions treated as pages (case-insensitive).
[scan]
# extensions = ["jpg", "jpeg", "tif", "tiff", "png", "webp", "avif"]
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = CollectionConfig::default();
        assert_eq!(config.flavor, FlavorKind::Directory);
        assert_eq!(config.output, "manifest.json");
        assert_eq!(config.ids.top_range, "top");
        assert_eq!(config.ids.root_range, "file-system");
        assert_eq!(config.dimensions.fallback, DefaultDimensions::Portrait);
        assert!(config.scan.extensions.contains(&"tif".to_string()));
    }

    #[test]
    fn parse_partial_config() {
        let config: CollectionConfig = toml::from_str(
            r#"
flavor = "mets"

[ids]
service_root = "https://images.example.edu/iiif/2"
"#,
        )
        .unwrap();
        assert_eq!(config.flavor, FlavorKind::Mets);
        assert_eq!(config.ids.service_root, "https://images.example.edu/iiif/2");
        // Default values preserved
        assert_eq!(config.ids.canvas_base, "https://iiif.example.org/canvas");
        assert_eq!(config.output, "manifest.json");
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.ids, IdsConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"
flavor = "ead"

[manifest]
attribution = "Georgetown Law Library"

[dimensions]
fallback = "landscape"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.flavor, FlavorKind::Ead);
        assert_eq!(config.manifest.attribution, "Georgetown Law Library");
        assert_eq!(config.dimensions.fallback, DefaultDimensions::Landscape);
        assert_eq!(config.manifest.label, "");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "this is not valid toml [[[").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_flavor_rejected() {
        let result: Result<CollectionConfig, _> = toml::from_str(r#"flavor = "marc""#);
        assert!(result.is_err());
    }

    #[test]
    fn is_page_matches_extensions_case_insensitively() {
        let scan = ScanConfig::default();
        assert!(scan.is_page(Path::new("box_1/IMG001.JPG")));
        assert!(scan.is_page(Path::new("vol_0004.tif")));
        assert!(!scan.is_page(Path::new("img001.toml")));
        assert!(!scan.is_page(Path::new("README")));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"output = "manifest.json""#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"output = "iiif.json""#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("output").unwrap().as_str(), Some("iiif.json"));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[ids]
top_range = "top"
root_range = "file-system"
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[ids]
root_range = "boxes"
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let ids = merged.get("ids").unwrap();
        assert_eq!(ids.get("root_range").unwrap().as_str(), Some("boxes"));
        // top_range preserved from base
        assert_eq!(ids.get("top_range").unwrap().as_str(), Some("top"));
    }

    #[test]
    fn merge_toml_replaces_arrays_whole() {
        let base: toml::Value = toml::from_str(
            r#"
[scan]
extensions = ["jpg", "tif"]
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[scan]
extensions = ["png"]
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let extensions = merged["scan"]["extensions"].as_array().unwrap();
        assert_eq!(extensions.len(), 1);
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[ids]
servce_root = "x"
"#;
        let result: Result<CollectionConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<CollectionConfig, _> = toml::from_str("[idz]\nmanifest = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[manifest]\ntitle = \"x\"\n").unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validation_rejects_empty_ids() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[ids]\nservice_root = \"\"\n").unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("ids.service_root"));
    }

    #[test]
    fn validation_rejects_empty_extensions() {
        let mut config = CollectionConfig::default();
        config.scan.extensions.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_empty_output() {
        let config = CollectionConfig {
            output: " ".into(),
            ..CollectionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // Stock config
    // =========================================================================

    #[test]
    fn stock_config_toml_is_valid_and_matches_defaults() {
        let config: CollectionConfig = toml::from_str(stock_config_toml()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.ids, IdsConfig::default());
        assert_eq!(config.scan, ScanConfig::default());
    }

    #[test]
    fn stock_defaults_value_round_trips() {
        let config = resolve_config(stock_defaults_value(), None).unwrap();
        assert_eq!(config.output, "manifest.json");
        assert_eq!(config.flavor, FlavorKind::Directory);
    }
}

//! Tool configuration.
//!
//! Handles loading, validating, and merging `gallery-manifest.toml`. Stock
//! defaults mirror the directory layout of the gallery website this tool feeds,
//! so a project that follows that layout needs no config file at all.
//!
//! ## Config File Location
//!
//! The file is looked up in the project root (`--root`, default `.`), or passed
//! explicitly with `--config`:
//!
//! ```text
//! site/
//! ├── gallery-manifest.toml        # Optional, overrides stock defaults
//! └── src/
//!     ├── assets/images/photos/    # paths.image_root
//!     ├── data/                    # paths.data_dir
//!     │   └── gallery-manifests/   # paths.manifest_dir
//!     └── pages/photographing/     # paths.page_root
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! image_root = "src/assets/images/photos"
//! manifest_dir = "src/data/gallery-manifests"
//! batch_root = "/tmp/gallery-batches"
//! data_dir = "src/data"
//! page_root = "src/pages/photographing"
//!
//! [init]
//! exiftool = "exiftool"
//! image_extensions = ["jpeg", "jpg"]
//!
//! [merge]
//! batch_size = 8
//! single_image_target = 80   # percent
//! max_two_up = 3
//! max_three_up = 2
//! max_split = 2
//! max_four_up = 1
//!
//! [generate]
//! image_import_root = "../../../assets/images/photos"
//! implicit_chapter_name = "Part I"
//! url_prefix = "/photographing"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [merge]
//! batch_size = 12
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the project root.
pub const CONFIG_FILENAME: &str = "gallery-manifest.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `gallery-manifest.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Where images, manifests, batch files, and generated output live.
    pub paths: PathsConfig,
    /// Manifest initialization (EXIF tool, image discovery).
    pub init: InitConfig,
    /// Batch merging and composition checks.
    pub merge: MergeConfig,
    /// Page and data file generation.
    pub generate: GenerateConfig,
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.merge.batch_size == 0 {
            return Err(ConfigError::Validation(
                "merge.batch_size must be greater than 0".into(),
            ));
        }
        if self.merge.single_image_target > 100 {
            return Err(ConfigError::Validation(
                "merge.single_image_target must be 0-100".into(),
            ));
        }
        if self.init.image_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "init.image_extensions must not be empty".into(),
            ));
        }
        if self.init.exiftool.trim().is_empty() {
            return Err(ConfigError::Validation(
                "init.exiftool must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Filesystem locations, relative to the project root unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory holding one sub-directory of photos per gallery.
    pub image_root: String,
    /// Directory holding `<gallery>.json` manifests.
    pub manifest_dir: String,
    /// Directory holding one sub-directory of `batch-N.json` files per gallery.
    pub batch_root: String,
    /// Directory receiving the generated `<gallery>.ts` data files.
    pub data_dir: String,
    /// Directory receiving one sub-directory of pages per gallery slug.
    pub page_root: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            image_root: "src/assets/images/photos".to_string(),
            manifest_dir: "src/data/gallery-manifests".to_string(),
            batch_root: "/tmp/gallery-batches".to_string(),
            data_dir: "src/data".to_string(),
            page_root: "src/pages/photographing".to_string(),
        }
    }
}

/// Manifest initialization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InitConfig {
    /// EXIF tool command (looked up on `PATH` unless absolute).
    pub exiftool: String,
    /// Image file extensions to pick up, matched case-insensitively.
    pub image_extensions: Vec<String>,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            exiftool: "exiftool".to_string(),
            image_extensions: vec!["jpeg".to_string(), "jpg".to_string()],
        }
    }
}

/// Batch merge settings and composition limits.
///
/// The limits are advisory: exceeding them produces warnings, never failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    /// Number of images covered by one batch review file.
    pub batch_size: usize,
    /// Minimum share (percent) of single-image blocks among image blocks.
    pub single_image_target: u32,
    pub max_two_up: usize,
    pub max_three_up: usize,
    pub max_split: usize,
    pub max_four_up: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            batch_size: 8,
            single_image_target: 80,
            max_two_up: 3,
            max_three_up: 2,
            max_split: 2,
            max_four_up: 1,
        }
    }
}

/// Page generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateConfig {
    /// Image import prefix as seen from a generated page file.
    pub image_import_root: String,
    /// Name of the chapter synthesized for blocks before the first `Chapter`.
    pub implicit_chapter_name: String,
    /// Public URL prefix under which gallery pages are served.
    pub url_prefix: String,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            image_import_root: "../../../assets/images/photos".to_string(),
            implicit_chapter_name: "Part I".to_string(),
            url_prefix: "/photographing".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ToolConfig::default()).expect("default config must serialize")
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

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `gallery-manifest.toml` from the project root, falling back to defaults.
pub fn load_config(root: &Path) -> Result<ToolConfig, ConfigError> {
    resolve_config(load_raw_config(&root.join(CONFIG_FILENAME))?)
}

/// Load an explicitly named config file. Unlike [`load_config`], the file must exist.
pub fn load_config_file(path: &Path) -> Result<ToolConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `gallery-manifest.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# gallery-manifest configuration
# ==============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Paths (relative to the project root unless absolute)
# ---------------------------------------------------------------------------
[paths]
# One sub-directory of photos per gallery.
image_root = "src/assets/images/photos"

# Gallery manifests, one <gallery>.json each.
manifest_dir = "src/data/gallery-manifests"

# Batch review files, one <gallery>/ directory of batch-N.json files each.
batch_root = "/tmp/gallery-batches"

# Generated <gallery>.ts data files.
data_dir = "src/data"

# Generated pages, one <slug>/ directory per gallery.
page_root = "src/pages/photographing"

# ---------------------------------------------------------------------------
# Manifest initialization
# ---------------------------------------------------------------------------
[init]
# EXIF reader used for width, height and capture time.
exiftool = "exiftool"

# Image extensions picked up from the gallery folder (case-insensitive).
image_extensions = ["jpeg", "jpg"]

# ---------------------------------------------------------------------------
# Batch merging
# ---------------------------------------------------------------------------
[merge]
# Images covered by one batch review file.
batch_size = 8

# Composition advice. Falling below / going above these only warns.
single_image_target = 80
max_two_up = 3
max_three_up = 2
max_split = 2
max_four_up = 1

# ---------------------------------------------------------------------------
# Page generation
# ---------------------------------------------------------------------------
[generate]
# Image import prefix as seen from a generated page.
image_import_root = "../../../assets/images/photos"

# Name of the chapter created for blocks placed before the first Chapter block.
implicit_chapter_name = "Part I"

# URL prefix the gallery pages are served under.
url_prefix = "/photographing"
"##
}

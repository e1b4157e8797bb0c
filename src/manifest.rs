//! Gallery manifest data model and JSON storage.
//!
//! A manifest is the single persisted record for one gallery: the photos found
//! by `init` and the layout blocks assembled by `merge`/`validate`.
//!
//! ```json
//! {
//!   "gallery": "merida-2026",
//!   "title": "MÉRIDA 2026",
//!   "slug": "merida",
//!   "year": "2026",
//!   "sourceFolder": "merida-2026",
//!   "images": [{ "filename": "DSCF001.jpeg", "width": 6000, "height": 4000,
//!                "aspect": 1.5, "orientation": "landscape", "timestamp": null }],
//!   "blocks": [{ "layout": "WideImage", "images": ["DSCF001.jpeg"],
//!                "props": {}, "notes": "" }]
//! }
//! ```
//!
//! [`Manifest`] is generic over its block type. Commands that accept
//! hand-authored drift (`merge`, `validate`) read `Manifest<RawBlock>`; the
//! generator reads `Manifest<Block>` and refuses anything non-canonical.
//! Top-level keys this crate doesn't know about are carried through untouched.
//!
//! [`RawBlock`]: crate::normalize::RawBlock

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "B: Deserialize<'de>"))]
pub struct Manifest<B = Block> {
    /// Gallery identifier; also the manifest's file stem.
    pub gallery: String,
    pub title: String,
    /// URL slug of the gallery's page directory.
    pub slug: String,
    pub year: String,
    /// On-disk image directory when it differs from `gallery` (versioned galleries).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_folder: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub blocks: Vec<B>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<B> Manifest<B> {
    /// Directory name the gallery's images live in.
    ///
    /// `sourceFolder` wins when set, so several manifest versions can share one
    /// set of photos; otherwise the gallery id is the folder.
    pub fn image_folder(&self) -> &str {
        self.source_folder
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.gallery)
    }

    /// Number of batch review files needed to cover every image.
    pub fn expected_batches(&self, batch_size: usize) -> usize {
        self.images.len().div_ceil(batch_size.max(1))
    }

    /// Swap the block list, keeping every other field.
    pub fn with_blocks<C>(self, blocks: Vec<C>) -> Manifest<C> {
        Manifest {
            gallery: self.gallery,
            title: self.title,
            slug: self.slug,
            year: self.year,
            source_folder: self.source_folder,
            images: self.images,
            blocks,
            extra: self.extra,
        }
    }
}

/// One photo, as measured by `init`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub filename: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// width / height, rounded to two decimals
    #[serde(default)]
    pub aspect: f64,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl Image {
    pub fn new(filename: impl Into<String>, width: u32, height: u32) -> Self {
        let aspect = if height == 0 {
            0.0
        } else {
            (f64::from(width) / f64::from(height) * 100.0).round() / 100.0
        };
        Self {
            filename: filename.into(),
            width,
            height,
            aspect,
            orientation: Orientation::from_dimensions(width, height),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Option<String>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    #[default]
    Portrait,
}

impl Orientation {
    /// Square images count as portrait.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Layout kind of a block.
///
/// Values outside the known set are kept as [`Layout::Unknown`] so a typo in a
/// hand-authored batch stays visible all the way to the generated page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Layout {
    FullBleed,
    WideImage,
    TwoUp,
    ThreeUp,
    FourUp,
    SplitLayout,
    OffsetImage,
    InsetImage,
    Spacer,
    Chapter,
    Unknown(String),
}

impl Layout {
    pub const KNOWN: [Layout; 10] = [
        Layout::FullBleed,
        Layout::WideImage,
        Layout::TwoUp,
        Layout::ThreeUp,
        Layout::FourUp,
        Layout::SplitLayout,
        Layout::OffsetImage,
        Layout::InsetImage,
        Layout::Spacer,
        Layout::Chapter,
    ];

    pub fn parse(name: &str) -> Layout {
        Layout::KNOWN
            .into_iter()
            .find(|l| l.as_str() == name)
            .unwrap_or_else(|| Layout::Unknown(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Layout::FullBleed => "FullBleed",
            Layout::WideImage => "WideImage",
            Layout::TwoUp => "TwoUp",
            Layout::ThreeUp => "ThreeUp",
            Layout::FourUp => "FourUp",
            Layout::SplitLayout => "SplitLayout",
            Layout::OffsetImage => "OffsetImage",
            Layout::InsetImage => "InsetImage",
            Layout::Spacer => "Spacer",
            Layout::Chapter => "Chapter",
            Layout::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Layout::Unknown(_))
    }

    /// Layouts showing exactly one photo.
    pub fn is_single_image(&self) -> bool {
        matches!(
            self,
            Layout::FullBleed | Layout::WideImage | Layout::OffsetImage | Layout::InsetImage
        )
    }

    /// Layouts arranging several photos together.
    pub fn is_multi_image(&self) -> bool {
        matches!(
            self,
            Layout::TwoUp | Layout::ThreeUp | Layout::FourUp | Layout::SplitLayout
        )
    }
}

impl From<String> for Layout {
    fn from(name: String) -> Self {
        match Layout::parse(&name) {
            Layout::Unknown(_) => Layout::Unknown(name),
            known => known,
        }
    }
}

impl From<Layout> for String {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical layout block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub layout: Layout,
    #[serde(default)]
    pub images: Vec<String>,
    /// Free-form on disk; read through [`Block::props`].
    #[serde(default)]
    pub props: Map<String, Value>,
    #[serde(default)]
    pub notes: String,
}

impl Block {
    pub fn new(layout: Layout, images: Vec<String>) -> Self {
        Self {
            layout,
            images,
            props: Map::new(),
            notes: String::new(),
        }
    }

    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }

    /// Typed view of the props meaningful to this block's layout.
    pub fn props(&self) -> BlockProps {
        BlockProps::from_parts(&self.layout, &self.props)
    }
}

/// Props of a block, keyed by layout kind.
///
/// Each variant carries only what its layouts render. Keys that don't apply to
/// the layout are ignored here but stay in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockProps {
    /// `FullBleed`, `WideImage`, `InsetImage`
    Single { priority: bool },
    Offset {
        align: Option<String>,
        size: Option<String>,
        priority: bool,
    },
    /// `TwoUp`, `ThreeUp`, `FourUp`
    Grid,
    Split { ratio: Option<String> },
    Spacer { size: Option<String> },
    Chapter {
        name: Option<String>,
        slug: Option<String>,
    },
    Unknown,
}

impl BlockProps {
    pub fn from_parts(layout: &Layout, props: &Map<String, Value>) -> Self {
        match layout {
            Layout::FullBleed | Layout::WideImage | Layout::InsetImage => BlockProps::Single {
                priority: prop_flag(props, "priority"),
            },
            Layout::OffsetImage => BlockProps::Offset {
                align: prop_text(props, "align"),
                size: prop_text(props, "size"),
                priority: prop_flag(props, "priority"),
            },
            Layout::TwoUp | Layout::ThreeUp | Layout::FourUp => BlockProps::Grid,
            Layout::SplitLayout => BlockProps::Split {
                ratio: prop_text(props, "ratio"),
            },
            Layout::Spacer => BlockProps::Spacer {
                size: prop_text(props, "size"),
            },
            Layout::Chapter => BlockProps::Chapter {
                name: prop_text(props, "name"),
                slug: prop_text(props, "slug"),
            },
            Layout::Unknown(_) => BlockProps::Unknown,
        }
    }

    /// Whether the block asks for eager (above-the-fold) loading.
    pub fn priority(&self) -> bool {
        match self {
            BlockProps::Single { priority } | BlockProps::Offset { priority, .. } => *priority,
            _ => false,
        }
    }
}

/// A prop rendered as text. Numbers are accepted; empty strings count as unset.
fn prop_text(props: &Map<String, Value>, key: &str) -> Option<String> {
    match props.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A prop read as a flag with the loose truthiness hand-written files rely on.
fn prop_flag(props: &Map<String, Value>, key: &str) -> bool {
    match props.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty() && s != "false",
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

// =============================================================================
// Storage
// =============================================================================

/// Read a manifest from disk.
pub fn load<B: DeserializeOwned>(path: &Path) -> Result<Manifest<B>, ManifestError> {
    if !path.is_file() {
        return Err(ManifestError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a manifest as 2-space indented JSON, creating parent directories.
pub fn save<B: Serialize>(path: &Path, manifest: &Manifest<B>) -> Result<(), ManifestError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use serde_json::json;
    use tempfile::TempDir;

    // =========================================================================
    // image_folder()
    // =========================================================================

    #[test]
    fn image_folder_uses_source_folder_when_set() {
        let mut manifest = manifest_with_blocks("merida-2026-v4", vec![]);
        manifest.source_folder = Some("merida-2026".to_string());
        assert_eq!(manifest.image_folder(), "merida-2026");
    }

    #[test]
    fn image_folder_falls_back_to_gallery() {
        let manifest = manifest_with_blocks("cabo-2025", vec![]);
        assert_eq!(manifest.image_folder(), "cabo-2025");
    }

    #[test]
    fn image_folder_ignores_empty_source_folder() {
        let mut manifest = manifest_with_blocks("cabo-2025", vec![]);
        manifest.source_folder = Some(String::new());
        assert_eq!(manifest.image_folder(), "cabo-2025");
    }

    #[test]
    fn expected_batches_rounds_up() {
        let mut manifest = manifest_with_blocks("g", vec![]);
        manifest.images = (0..17).map(|i| image(&format!("{i:03}.jpeg"))).collect();
        assert_eq!(manifest.expected_batches(8), 3);
        manifest.images.truncate(16);
        assert_eq!(manifest.expected_batches(8), 2);
        manifest.images.clear();
        assert_eq!(manifest.expected_batches(8), 0);
    }

    // =========================================================================
    // Image
    // =========================================================================

    #[test]
    fn image_derives_aspect_and_orientation() {
        let img = Image::new("a.jpeg", 6000, 4000);
        assert_eq!(img.aspect, 1.5);
        assert_eq!(img.orientation, Orientation::Landscape);

        let img = Image::new("b.jpeg", 4000, 6000);
        assert_eq!(img.aspect, 0.67);
        assert_eq!(img.orientation, Orientation::Portrait);
    }

    #[test]
    fn square_image_is_portrait() {
        assert_eq!(Image::new("sq.jpeg", 100, 100).orientation, Orientation::Portrait);
    }

    #[test]
    fn zero_height_image_has_zero_aspect() {
        assert_eq!(Image::new("broken.jpeg", 100, 0).aspect, 0.0);
    }

    // =========================================================================
    // Layout
    // =========================================================================

    #[test]
    fn layout_parses_known_names() {
        assert_eq!(Layout::parse("FourUp"), Layout::FourUp);
        assert_eq!(Layout::parse("Chapter"), Layout::Chapter);
    }

    #[test]
    fn layout_keeps_unknown_names_verbatim() {
        let layout = Layout::parse("Fullbleed");
        assert_eq!(layout, Layout::Unknown("Fullbleed".to_string()));
        assert!(!layout.is_known());
        assert_eq!(layout.to_string(), "Fullbleed");
    }

    #[test]
    fn layout_serializes_as_plain_string() {
        let value = serde_json::to_value(Layout::SplitLayout).unwrap();
        assert_eq!(value, json!("SplitLayout"));
        let back: Layout = serde_json::from_value(json!("Mosaic")).unwrap();
        assert_eq!(back, Layout::Unknown("Mosaic".to_string()));
    }

    #[test]
    fn layout_image_classes() {
        assert!(Layout::InsetImage.is_single_image());
        assert!(!Layout::InsetImage.is_multi_image());
        assert!(Layout::SplitLayout.is_multi_image());
        assert!(!Layout::Spacer.is_single_image());
        assert!(!Layout::Spacer.is_multi_image());
    }

    // =========================================================================
    // BlockProps
    // =========================================================================

    #[test]
    fn offset_props_pick_up_align_size_priority() {
        let b = block(Layout::OffsetImage, &["a.jpeg"])
            .with_prop("align", "left")
            .with_prop("size", "large")
            .with_prop("priority", true);
        assert_eq!(
            b.props(),
            BlockProps::Offset {
                align: Some("left".to_string()),
                size: Some("large".to_string()),
                priority: true,
            }
        );
    }

    #[test]
    fn props_irrelevant_to_layout_are_ignored() {
        let b = block(Layout::TwoUp, &["a.jpeg", "b.jpeg"]).with_prop("priority", true);
        assert_eq!(b.props(), BlockProps::Grid);
        assert!(!b.props().priority());
        // ...but still persisted
        assert_eq!(b.props.get("priority"), Some(&json!(true)));
    }

    #[test]
    fn numeric_prop_renders_as_text() {
        let b = block(Layout::Spacer, &[]).with_prop("size", 3);
        assert_eq!(
            b.props(),
            BlockProps::Spacer {
                size: Some("3".to_string())
            }
        );
    }

    #[test]
    fn priority_flag_truthiness() {
        let on = |v: Value| block(Layout::WideImage, &["a.jpeg"]).with_prop("priority", v).props().priority();
        assert!(on(json!(true)));
        assert!(on(json!(1)));
        assert!(on(json!("yes")));
        assert!(!on(json!(false)));
        assert!(!on(json!(0)));
        assert!(!on(json!("")));
        assert!(!on(json!("false")));
        assert!(!on(Value::Null));
    }

    #[test]
    fn chapter_props_treat_blank_as_missing() {
        let b = chapter_block("Uxmal", "  ");
        assert_eq!(
            b.props(),
            BlockProps::Chapter {
                name: Some("Uxmal".to_string()),
                slug: None,
            }
        );
    }

    // =========================================================================
    // Storage
    // =========================================================================

    #[test]
    fn load_missing_manifest_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = load::<Block>(&tmp.path().join("nope.json"));
        assert!(matches!(result, Err(ManifestError::NotFound(_))));
    }

    #[test]
    fn load_invalid_json_reports_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load::<Block>(&path).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn save_then_load_preserves_unknown_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/gallery.json");
        let mut manifest = manifest_with_blocks("g", vec![block(Layout::WideImage, &["a.jpeg"])]);
        manifest
            .extra
            .insert("lastReviewedIndex".to_string(), json!(12));

        save(&path, &manifest).unwrap();
        let loaded: Manifest = load(&path).unwrap();
        assert_eq!(loaded, manifest);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"lastReviewedIndex\": 12"));
        assert!(!raw.contains("sourceFolder"));
    }

    #[test]
    fn load_with_block_type_lacking_default() {
        #[derive(Debug, Deserialize)]
        struct LayoutOnly {
            layout: String,
        }

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("g.json");
        fs::write(
            &path,
            r#"{ "gallery": "g", "title": "G", "slug": "g", "year": "2026",
                 "blocks": [{ "layout": "Spacer" }] }"#,
        )
        .unwrap();
        let loaded: Manifest<LayoutOnly> = load(&path).unwrap();
        assert_eq!(loaded.blocks[0].layout, "Spacer");

        fs::write(&path, r#"{ "gallery": "g", "title": "G", "slug": "g", "year": "2026" }"#).unwrap();
        let empty: Manifest<LayoutOnly> = load(&path).unwrap();
        assert!(empty.blocks.is_empty());
    }

    #[test]
    fn source_folder_serializes_camel_case() {
        let mut manifest = manifest_with_blocks("g-v2", vec![]);
        manifest.source_folder = Some("g".to_string());
        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(value["sourceFolder"], json!("g"));
    }

    #[test]
    fn block_fields_default_when_absent() {
        let b: Block = serde_json::from_value(json!({ "layout": "Spacer" })).unwrap();
        assert!(b.images.is_empty());
        assert!(b.props.is_empty());
        assert_eq!(b.notes, "");
    }
}

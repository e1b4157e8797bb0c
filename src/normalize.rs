//! Block normalization.
//!
//! Batch review files are written by hand (or by an agent working like one)
//! and drift from the canonical block shape in a few recurring ways:
//!
//! | Drift | Canonical form | Fix label |
//! |-------|----------------|-----------|
//! | `"type": "WideImage"` | `"layout": "WideImage"` | `type→layout` |
//! | `"images": [3, 4]` | `"images": ["DSCF004.jpeg", "DSCF005.jpeg"]` | `index→filename` |
//! | `"note": "..."` | `"notes": "..."` | `note→notes` |
//! | `"images": "DSCF004.jpeg"` | `"images": ["DSCF004.jpeg"]` | `image→list` |
//!
//! All of that tolerance lives in [`normalize_block`]: it turns one
//! [`RawBlock`] into one canonical [`Block`] and never fails. Anything it
//! can't repair safely is degraded (fallback layout, `UNKNOWN_<n>` image,
//! dropped field) and reported as a [`BlockIssue`], so one bad block never
//! costs the rest.

use crate::manifest::{Block, Image, Layout};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Layout substituted when a block names none.
pub const FALLBACK_LAYOUT: Layout = Layout::WideImage;

/// A block as found in a batch file or an unvalidated manifest.
///
/// Reading a block never fails: a field of the wrong JSON type is dropped and
/// reported through `shape_issues`, and a bare image reference where a list
/// belongs is wrapped into one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct RawBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Repairs made while reading the JSON.
    #[serde(skip)]
    pub shape_fixes: Vec<Fix>,
    #[serde(skip)]
    pub shape_issues: Vec<BlockIssue>,
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        RawBlock {
            layout: Some(block.layout.into()),
            images: Some(block.images.into_iter().map(ImageRef::Filename).collect()),
            props: Some(block.props),
            notes: Some(block.notes),
            ..RawBlock::default()
        }
    }
}

impl From<Value> for RawBlock {
    fn from(value: Value) -> Self {
        let mut raw = RawBlock::default();
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                raw.wrong_type("block", &other);
                return raw;
            }
        };

        raw.layout = raw.string_field(fields.remove("layout"), "layout");
        raw.kind = raw.string_field(fields.remove("type"), "type");
        raw.notes = raw.string_field(fields.remove("notes"), "notes");
        raw.note = raw.string_field(fields.remove("note"), "note");
        raw.images = raw.image_refs(fields.remove("images"));
        raw.props = match fields.remove("props") {
            None | Some(Value::Null) => None,
            Some(Value::Object(props)) => Some(props),
            Some(other) => {
                raw.wrong_type("props", &other);
                None
            }
        };
        raw
    }
}

impl RawBlock {
    fn wrong_type(&mut self, field: &'static str, value: &Value) {
        if !self.shape_fixes.contains(&Fix::DroppedField) {
            self.shape_fixes.push(Fix::DroppedField);
        }
        self.shape_issues.push(BlockIssue::WrongType {
            field,
            found: json_type(value),
        });
    }

    fn string_field(&mut self, value: Option<Value>, field: &'static str) -> Option<String> {
        match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                self.wrong_type(field, &other);
                None
            }
        }
    }

    fn image_refs(&mut self, value: Option<Value>) -> Option<Vec<ImageRef>> {
        let items = match value? {
            Value::Null => return None,
            Value::Array(items) => items,
            single @ (Value::String(_) | Value::Number(_)) => {
                self.shape_fixes.push(Fix::ImageToList);
                vec![single]
            }
            other => {
                self.wrong_type("images", &other);
                return Some(Vec::new());
            }
        };
        let refs = items
            .into_iter()
            .filter_map(|item| match ImageRef::from_value(&item) {
                Some(r) => Some(r),
                None => {
                    self.wrong_type("images", &item);
                    None
                }
            })
            .collect();
        Some(refs)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// An image reference: a filename, or a position in the manifest's image list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ImageRef {
    Index(i64),
    Filename(String),
}

impl ImageRef {
    /// Fractional indices are truncated toward zero.
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) => Some(ImageRef::Filename(name.clone())),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .map(ImageRef::Index),
            _ => None,
        }
    }
}

/// A repair applied to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fix {
    TypeToLayout,
    IndexToFilename,
    NoteToNotes,
    ImageToList,
    DroppedField,
    FallbackLayout,
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Fix::TypeToLayout => "type→layout",
            Fix::IndexToFilename => "index→filename",
            Fix::NoteToNotes => "note→notes",
            Fix::ImageToList => "image→list",
            Fix::DroppedField => "dropped invalid field",
            Fix::FallbackLayout => "fallback layout",
        })
    }
}

/// A problem that couldn't be repaired faithfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockIssue {
    /// No `layout` or `type`; the fallback layout was used.
    MissingLayout,
    /// Layout outside the known set; kept as-is.
    InvalidLayout(String),
    /// Image index past the end of the manifest's image list.
    ImageIndexOutOfRange(i64),
    /// A field held the wrong JSON type and was dropped.
    WrongType {
        field: &'static str,
        found: &'static str,
    },
}

impl fmt::Display for BlockIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockIssue::MissingLayout => write!(f, "missing layout"),
            BlockIssue::InvalidLayout(name) => write!(f, "invalid layout \"{name}\""),
            BlockIssue::ImageIndexOutOfRange(i) => write!(f, "image index {i} out of range"),
            BlockIssue::WrongType { field, found } => {
                write!(f, "\"{field}\" has the wrong type ({found}); ignored")
            }
        }
    }
}

/// Result of normalizing one block.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub block: Block,
    pub fixes: Vec<Fix>,
    pub issues: Vec<BlockIssue>,
}

/// Canonicalize one raw block against the manifest's image list.
pub fn normalize_block(raw: RawBlock, images: &[Image]) -> Normalized {
    let mut fixes = raw.shape_fixes;
    let mut issues = raw.shape_issues;

    let layout_name = non_empty(raw.layout);
    let type_name = non_empty(raw.kind);
    let layout = match (layout_name, type_name) {
        (Some(name), _) => Layout::from(name),
        (None, Some(name)) => {
            fixes.push(Fix::TypeToLayout);
            Layout::from(name)
        }
        (None, None) => {
            fixes.push(Fix::FallbackLayout);
            issues.push(BlockIssue::MissingLayout);
            FALLBACK_LAYOUT
        }
    };
    if !layout.is_known() {
        issues.push(BlockIssue::InvalidLayout(layout.to_string()));
    }

    let mut resolved_index = false;
    let filenames = raw
        .images
        .unwrap_or_default()
        .into_iter()
        .map(|r| match r {
            ImageRef::Filename(name) => name,
            ImageRef::Index(i) => {
                resolved_index = true;
                match usize::try_from(i).ok().and_then(|i| images.get(i)) {
                    Some(image) => image.filename.clone(),
                    None => {
                        issues.push(BlockIssue::ImageIndexOutOfRange(i));
                        format!("UNKNOWN_{i}")
                    }
                }
            }
        })
        .collect();
    if resolved_index {
        fixes.push(Fix::IndexToFilename);
    }

    let notes = match (non_empty(raw.notes), non_empty(raw.note)) {
        (Some(notes), _) => notes,
        (None, Some(note)) => {
            fixes.push(Fix::NoteToNotes);
            note
        }
        (None, None) => String::new(),
    };

    Normalized {
        block: Block {
            layout,
            images: filenames,
            props: raw.props.unwrap_or_default(),
            notes,
        },
        fixes,
        issues,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Fixes applied to the block at `index`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockFixes {
    pub index: usize,
    pub layout: Layout,
    pub fixes: Vec<Fix>,
}

/// An issue found in the block at `index`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedIssue {
    pub index: usize,
    pub issue: BlockIssue,
}

/// Outcome of normalizing a whole block list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeReport {
    pub blocks: Vec<Block>,
    pub fixed: Vec<BlockFixes>,
    pub issues: Vec<IndexedIssue>,
}

impl NormalizeReport {
    /// Whether any block changed shape.
    pub fn changed(&self) -> bool {
        !self.fixed.is_empty()
    }
}

/// Normalize every block in order. `offset` shifts the reported indices, for
/// callers that normalize a list in slices.
pub fn normalize_blocks(
    raw: impl IntoIterator<Item = RawBlock>,
    images: &[Image],
    offset: usize,
) -> NormalizeReport {
    let mut report = NormalizeReport::default();
    for (i, raw_block) in raw.into_iter().enumerate() {
        let index = offset + i;
        let Normalized {
            block,
            fixes,
            issues,
        } = normalize_block(raw_block, images);

        for issue in issues {
            tracing::warn!(block = index, layout = %block.layout, "{issue}");
            report.issues.push(IndexedIssue { index, issue });
        }
        if !fixes.is_empty() {
            tracing::debug!(block = index, ?fixes, "normalized block");
            report.fixed.push(BlockFixes {
                index,
                layout: block.layout.clone(),
                fixes,
            });
        }
        report.blocks.push(block);
    }
    report
}

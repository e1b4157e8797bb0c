//! Centralized naming conventions.
//!
//! Three kinds of names are parsed or produced in one place so every command
//! agrees on them:
//!
//! - **Batch files**: `batch-<N>.json`, where `N` may be zero-padded
//!   (`batch-03.json` and `batch-3.json` are both batch 3).
//! - **Slugs**: URL-safe path segments derived from display names.
//! - **Import identifiers**: the synthetic `imgNNN` names generated pages use
//!   for image imports.

const BATCH_PREFIX: &str = "batch-";
const BATCH_SUFFIX: &str = ".json";

/// Parse the batch index out of a `batch-<N>.json` filename.
///
/// - `"batch-0.json"` → `Some(0)`
/// - `"batch-07.json"` → `Some(7)`
/// - `"batch-.json"` → `None`
/// - `"batch-3.json.bak"` → `None`
/// - `"batch-3a.json"` → `None`
pub fn parse_batch_filename(name: &str) -> Option<u32> {
    let digits = name.strip_prefix(BATCH_PREFIX)?.strip_suffix(BATCH_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Canonical filename for a batch index (`batch-03.json`).
pub fn batch_filename(index: u32) -> String {
    format!("{BATCH_PREFIX}{index:02}{BATCH_SUFFIX}")
}

const MAX_SLUG_LEN: usize = 80;

/// Turn a display name into a lowercase URL slug.
///
/// - Lowercases ASCII letters
/// - Replaces anything that isn't alphanumeric or a dash with a dash
/// - Collapses consecutive dashes, strips leading and trailing ones
/// - Truncates to `MAX_SLUG_LEN` characters (breaks at last dash before limit)
pub fn sanitize_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut prev_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    let trimmed = slug.trim_end_matches('-');

    if trimmed.len() <= MAX_SLUG_LEN {
        trimmed.to_string()
    } else {
        let truncated = &trimmed[..MAX_SLUG_LEN];
        match truncated.rfind('-') {
            Some(pos) => truncated[..pos].to_string(),
            None => truncated.to_string(),
        }
    }
}

/// Identifier for the `index`-th distinct image imported by a page.
pub fn import_name(index: usize) -> String {
    format!("img{index:03}")
}

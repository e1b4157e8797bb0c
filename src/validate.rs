//! Manifest validation.
//!
//! `validate` is the repair pass run after hand edits: it normalizes every
//! block, looks for repeated images, and rewrites the manifest only when some
//! block actually changed shape. A manifest that is already canonical is left
//! byte-for-byte alone.

use crate::duplicates::{self, DuplicateImage};
use crate::manifest::{self, Manifest, ManifestError};
use crate::merge::LayoutStats;
use crate::normalize::{self, BlockFixes, IndexedIssue, RawBlock};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("{0}")]
    Manifest(ManifestError),
}

impl From<ManifestError> for ValidateError {
    fn from(e: ManifestError) -> Self {
        match e {
            ManifestError::NotFound(path) => ValidateError::NotFound(path),
            other => ValidateError::Manifest(other),
        }
    }
}

#[derive(Debug)]
pub struct ValidateReport {
    pub manifest_path: PathBuf,
    pub block_count: usize,
    pub fixed: Vec<BlockFixes>,
    pub issues: Vec<IndexedIssue>,
    pub duplicates: Vec<DuplicateImage>,
    /// Whether the manifest was rewritten.
    pub written: bool,
    pub stats: LayoutStats,
}

pub fn validate(path: &Path) -> Result<ValidateReport, ValidateError> {
    let manifest: Manifest<RawBlock> = manifest::load(path)?;
    let normalized = normalize::normalize_blocks(manifest.blocks.clone(), &manifest.images, 0);

    let duplicates = duplicates::find_duplicate_images(&normalized.blocks);
    for dup in &duplicates {
        tracing::warn!(block = dup.block_index, image = %dup.image, "duplicate image");
    }
    let stats = LayoutStats::from_blocks(&normalized.blocks);

    let written = normalized.changed();
    if written {
        let manifest = manifest.with_blocks(normalized.blocks);
        manifest::save(path, &manifest)?;
        tracing::debug!(path = %path.display(), fixed = normalized.fixed.len(), "rewrote manifest");
    }

    Ok(ValidateReport {
        manifest_path: path.to_path_buf(),
        block_count: stats.total(),
        fixed: normalized.fixed,
        issues: normalized.issues,
        duplicates,
        written,
        stats,
    })
}

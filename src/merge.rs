//! Batch merging.
//!
//! Layout review happens in batches of `merge.batch_size` images, each written
//! to `<batch_root>/<gallery>/batch-<N>.json`:
//!
//! ```json
//! { "batchIndex": 0, "startImage": 0, "endImage": 7,
//!   "blocks": [{ "layout": "FullBleed", "images": ["DSCF001.jpeg"] }] }
//! ```
//!
//! `merge` concatenates every batch's blocks in numeric batch order, runs them
//! through [`normalize`](crate::normalize) and replaces the manifest's block
//! list wholesale, so re-running it after fixing a batch is always safe.
//!
//! Composition checks (share of single-image blocks, caps on grid layouts) are
//! advisory and only ever produce warnings.

use crate::config::MergeConfig;
use crate::manifest::{self, Block, Layout, Manifest, ManifestError};
use crate::naming;
use crate::normalize::{self, BlockFixes, IndexedIssue, RawBlock};
use crate::paths::Project;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Manifest not found: {0}. Run init first.")]
    ManifestNotFound(PathBuf),
    #[error("{0}")]
    Manifest(ManifestError),
    #[error("Batch directory not found: {0}. Run batch reviews first.")]
    BatchDirNotFound(PathBuf),
    #[error("No batch files found in {0}")]
    NoBatchFiles(PathBuf),
    #[error("Invalid batch file {path}: {source}")]
    BatchParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ManifestError> for MergeError {
    fn from(e: ManifestError) -> Self {
        match e {
            ManifestError::NotFound(path) => MergeError::ManifestNotFound(path),
            other => MergeError::Manifest(other),
        }
    }
}

/// Contents of one `batch-<N>.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFile {
    #[serde(default)]
    pub batch_index: Option<i64>,
    #[serde(default)]
    pub start_image: Option<i64>,
    #[serde(default)]
    pub end_image: Option<i64>,
    #[serde(default)]
    pub blocks: Vec<RawBlock>,
}

/// A batch file found on disk, before it is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub index: u32,
    pub name: String,
    pub path: PathBuf,
}

/// Per-batch line of the merge report.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub name: String,
    pub index: u32,
    pub block_count: usize,
    pub start_image: Option<i64>,
    pub end_image: Option<i64>,
}

/// Everything `merge` found and did.
#[derive(Debug)]
pub struct MergeReport {
    pub manifest_path: PathBuf,
    pub gallery: String,
    pub batches: Vec<BatchSummary>,
    pub expected_batches: usize,
    /// Indices in `0..expected_batches` with no batch file.
    pub missing_batches: Vec<u32>,
    /// Indices claimed by more than one file.
    pub duplicate_indices: Vec<u32>,
    pub block_count: usize,
    pub fixed: Vec<BlockFixes>,
    pub issues: Vec<IndexedIssue>,
    pub stats: LayoutStats,
    pub composition: Composition,
}

/// Merge all batch files of `gallery` into its manifest.
///
/// Every batch is read before anything is written; a malformed batch leaves
/// the manifest untouched.
pub fn merge(
    project: &Project,
    config: &MergeConfig,
    gallery: &str,
) -> Result<MergeReport, MergeError> {
    let manifest_path = project.manifest_path(gallery);
    // Existing blocks are replaced, so they are not interpreted at all.
    let manifest: Manifest<Value> = manifest::load(&manifest_path)?;

    let batch_dir = project.batch_dir(gallery);
    if !batch_dir.is_dir() {
        return Err(MergeError::BatchDirNotFound(batch_dir));
    }
    let entries = find_batch_files(&batch_dir)?;
    if entries.is_empty() {
        return Err(MergeError::NoBatchFiles(batch_dir));
    }

    let expected_batches = manifest.expected_batches(config.batch_size);
    tracing::debug!(
        found = entries.len(),
        expected = expected_batches,
        dir = %batch_dir.display(),
        "found batch files"
    );

    let found: BTreeSet<u32> = entries.iter().map(|e| e.index).collect();
    let missing_batches: Vec<u32> = (0..expected_batches)
        .filter_map(|i| u32::try_from(i).ok())
        .filter(|i| !found.contains(i))
        .collect();
    if !missing_batches.is_empty() {
        tracing::warn!(
            ?missing_batches,
            "missing batches; some images will not have layout blocks"
        );
    }
    let shared_indices = duplicate_indices(&entries);
    for index in &shared_indices {
        tracing::warn!(index, "several batch files share one index; merged in filename order");
    }

    let mut batches = Vec::with_capacity(entries.len());
    let mut raw_blocks = Vec::new();
    for entry in &entries {
        let batch = read_batch(&entry.path)?;
        if let Some(declared) = batch.batch_index
            && declared != i64::from(entry.index)
        {
            tracing::warn!(
                file = %entry.name,
                declared,
                "batchIndex disagrees with filename; filename order wins"
            );
        }
        batches.push(BatchSummary {
            name: entry.name.clone(),
            index: entry.index,
            block_count: batch.blocks.len(),
            start_image: batch.start_image,
            end_image: batch.end_image,
        });
        raw_blocks.extend(batch.blocks);
    }

    let normalized = normalize::normalize_blocks(raw_blocks, &manifest.images, 0);
    let stats = LayoutStats::from_blocks(&normalized.blocks);
    let composition = check_composition(&stats, config);
    for warning in &composition.warnings {
        tracing::warn!("{warning}");
    }

    let manifest = manifest.with_blocks(normalized.blocks);
    manifest::save(&manifest_path, &manifest)?;

    Ok(MergeReport {
        manifest_path,
        gallery: manifest.gallery,
        batches,
        expected_batches,
        missing_batches,
        duplicate_indices: shared_indices,
        block_count: manifest.blocks.len(),
        fixed: normalized.fixed,
        issues: normalized.issues,
        stats,
        composition,
    })
}

/// `batch-<N>.json` files directly inside `dir`, in numeric order.
///
/// Ties (`batch-3.json` next to `batch-03.json`) are broken by filename.
pub fn find_batch_files(dir: &Path) -> Result<Vec<BatchEntry>, MergeError> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(index) = naming::parse_batch_filename(&name) {
            entries.push(BatchEntry {
                index,
                name,
                path: entry.into_path(),
            });
        }
    }
    entries.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

fn duplicate_indices(entries: &[BatchEntry]) -> Vec<u32> {
    let mut dups: Vec<u32> = entries
        .windows(2)
        .filter(|w| w[0].index == w[1].index)
        .map(|w| w[0].index)
        .collect();
    dups.dedup();
    dups
}

pub fn read_batch(path: &Path) -> Result<BatchFile, MergeError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| MergeError::BatchParse {
        path: path.to_path_buf(),
        source,
    })
}

// =============================================================================
// Layout statistics
// =============================================================================

/// Block counts per layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutStats {
    counts: BTreeMap<Layout, usize>,
    total: usize,
}

impl LayoutStats {
    pub fn from_blocks(blocks: &[Block]) -> Self {
        let mut stats = Self::default();
        for block in blocks {
            stats.record(&block.layout);
        }
        stats
    }

    pub fn record(&mut self, layout: &Layout) {
        *self.counts.entry(layout.clone()).or_default() += 1;
        self.total += 1;
    }

    pub fn count(&self, layout: &Layout) -> usize {
        self.counts.get(layout).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Counts sorted by count descending, then layout name.
    pub fn distribution(&self) -> Vec<(&Layout, usize)> {
        let mut rows: Vec<(&Layout, usize)> = self.counts.iter().map(|(l, c)| (l, *c)).collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
        rows
    }

    fn sum_where(&self, pred: impl Fn(&Layout) -> bool) -> usize {
        self.counts
            .iter()
            .filter(|&(l, _)| pred(l))
            .map(|(_, c)| c)
            .sum()
    }
}

// =============================================================================
// Composition check
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositionWarning {
    BelowSingleTarget { percent: u32, target: u32 },
    OverCap { layout: Layout, count: usize, max: usize },
}

impl fmt::Display for CompositionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositionWarning::BelowSingleTarget { percent, target } => write!(
                f,
                "Single-image layouts at {percent}%, below {target}% target. Consider reducing multi-image layouts."
            ),
            CompositionWarning::OverCap { layout, count, max } => {
                write!(f, "{layout}: {count} (max recommended: {max})")
            }
        }
    }
}

/// Outcome of the composition check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition {
    /// Share of single-image blocks among image blocks; `None` without image blocks.
    pub single_percent: Option<u32>,
    pub target: u32,
    pub warnings: Vec<CompositionWarning>,
}

pub fn check_composition(stats: &LayoutStats, config: &MergeConfig) -> Composition {
    let single = stats.sum_where(Layout::is_single_image);
    let multi = stats.sum_where(Layout::is_multi_image);
    let image_blocks = single + multi;

    let mut composition = Composition {
        target: config.single_image_target,
        ..Composition::default()
    };
    if image_blocks == 0 {
        return composition;
    }

    let percent = (single as f64 * 100.0 / image_blocks as f64).round() as u32;
    composition.single_percent = Some(percent);
    if percent < config.single_image_target {
        composition
            .warnings
            .push(CompositionWarning::BelowSingleTarget {
                percent,
                target: config.single_image_target,
            });
    }

    let caps = [
        (Layout::TwoUp, config.max_two_up),
        (Layout::ThreeUp, config.max_three_up),
        (Layout::SplitLayout, config.max_split),
        (Layout::FourUp, config.max_four_up),
    ];
    for (layout, max) in caps {
        let count = stats.count(&layout);
        if count > max {
            composition
                .warnings
                .push(CompositionWarning::OverCap { layout, count, max });
        }
    }
    composition
}

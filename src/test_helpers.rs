//! Shared test utilities.
//!
//! Builders for manifests and blocks, plus a small on-disk project layout for
//! tests that exercise whole commands.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let manifest = manifest_with_blocks("merida", vec![
//!     block(Layout::FullBleed, &["DSCF001.jpeg"]),
//!     chapter_block("Uxmal", "uxmal"),
//!     block(Layout::TwoUp, &["DSCF002.jpeg", "DSCF003.jpeg"]),
//! ]);
//! ```

use std::path::Path;

use serde::Serialize;
use serde_json::Map;
use tempfile::TempDir;

use crate::config::PathsConfig;
use crate::manifest::{Block, Image, Layout, Manifest};
use crate::paths::Project;

// =========================================================================
// Builders
// =========================================================================

pub fn block(layout: Layout, images: &[&str]) -> Block {
    Block::new(layout, images.iter().map(|s| s.to_string()).collect())
}

pub fn chapter_block(name: &str, slug: &str) -> Block {
    Block::new(Layout::Chapter, vec![])
        .with_prop("name", name)
        .with_prop("slug", slug)
}

/// A 3:2 landscape image.
pub fn image(filename: &str) -> Image {
    Image::new(filename, 6000, 4000)
}

/// A manifest whose slug equals its gallery id and that has no images.
pub fn manifest_with_blocks(gallery: &str, blocks: Vec<Block>) -> Manifest {
    Manifest {
        gallery: gallery.to_string(),
        title: "Test Gallery".to_string(),
        slug: gallery.to_string(),
        year: "2026".to_string(),
        source_folder: None,
        images: vec![],
        blocks,
        extra: Map::new(),
    }
}

// =========================================================================
// Filesystem
// =========================================================================

/// A project rooted in a fresh temp dir, with the batch root moved inside it.
pub fn temp_project() -> (TempDir, Project) {
    let tmp = TempDir::new().unwrap();
    let paths = PathsConfig {
        batch_root: "batches".to_string(),
        ..PathsConfig::default()
    };
    let project = Project::new(tmp.path(), paths);
    (tmp, project)
}

/// Serialize `value` as pretty JSON at `path`, creating parent directories.
pub fn write_json(path: &Path, value: &impl Serialize) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

//! # Gallery Manifest
//!
//! Tooling that turns a hand-curated JSON gallery manifest (a list of photos
//! plus layout instructions) into the data and page files of a photo-gallery
//! website.
//!
//! # Architecture: Four-Step Pipeline
//!
//! ```text
//! 1. init       photos/     →  manifest.json          (EXIF → images list)
//!    (review)   manifest    →  batch-N.json           (layouts, by hand or agent)
//! 2. merge      batch-N     →  manifest.json blocks   (ordered concat + normalize)
//! 3. validate   manifest    →  manifest.json          (repair drift, report duplicates)
//! 4. generate   manifest    →  data/<g>.ts + pages/   (one page per chapter)
//! ```
//!
//! The manifest is the only persisted state. Every step reads it from disk,
//! transforms it, and writes it back (or, for `generate`, writes derived
//! files), so any step can be re-run after editing its inputs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`manifest`] | Manifest, image and block data model; JSON load/save |
//! | [`normalize`] | Tolerant raw-block → canonical-block conversion |
//! | [`merge`] | Batch discovery and merge, layout statistics, composition check |
//! | [`validate`] | Normalize + duplicate scan + conditional rewrite |
//! | [`duplicates`] | Repeated image detection |
//! | [`chapters`] | Chapter segmentation and prev/next navigation |
//! | [`generate`] | Data file and page rendering |
//! | [`init`] | Manifest creation from an image directory |
//! | [`exif`] | `MetadataReader` seam and the `exiftool` implementation |
//! | [`paths`] | Gallery folder/name resolution and project file locations |
//! | [`naming`] | Batch filenames, slugs, import identifiers |
//! | [`config`] | `gallery-manifest.toml` loading, merging, validation |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## Tolerate Drift on Input, Emit Canonical Output
//!
//! Batch files are written by reviewers who don't always follow the schema
//! (`type` instead of `layout`, image indices instead of filenames). `merge`
//! and `validate` accept those shapes and repair them; `generate` only accepts
//! the canonical form, so a page is never rendered from a half-understood
//! block.
//!
//! ## Warnings Are Data
//!
//! Missing batches, duplicate images, unknown layouts, and composition limits
//! never stop a run. They are collected into each command's report (and logged
//! through `tracing`) so the user sees all of them at once.

pub mod chapters;
pub mod config;
pub mod duplicates;
pub mod exif;
pub mod generate;
pub mod init;
pub mod manifest;
pub mod merge;
pub mod naming;
pub mod normalize;
pub mod output;
pub mod paths;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;

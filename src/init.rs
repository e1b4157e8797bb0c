//! Manifest initialization.
//!
//! First pipeline stage: measure every photo in a gallery folder and write a
//! fresh manifest with an empty block list, ready for batch review.
//!
//! ```text
//! src/assets/images/photos/merida-2026/*.jpeg
//!         │  exiftool
//!         ▼
//! src/data/gallery-manifests/merida.json     (images sorted by filename)
//! /tmp/gallery-batches/merida/               (emptied of old batch-*.json)
//! ```
//!
//! Nothing is written until the image directory has been listed and every
//! image measured, so a failed run leaves the previous manifest intact.

use crate::config::InitConfig;
use crate::exif::{self, ExifError, MetadataReader};
use crate::manifest::{self, Image, Manifest, ManifestError};
use crate::naming;
use crate::paths::{self, Project};
use chrono::Datelike;
use serde_json::Map;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum InitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Manifest(#[from] ManifestError),
    #[error("Failed to extract EXIF data: {0}")]
    Exif(#[from] ExifError),
    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),
    #[error("Image directory not found: {0}")]
    ImageDirNotFound(PathBuf),
    #[error("No images found in {0}")]
    NoImages(PathBuf),
    #[error("No width/height reported for {0}")]
    MissingDimensions(String),
}

/// Arguments of the `init` command.
#[derive(Debug, Clone)]
pub struct InitRequest<'a> {
    /// Folder name or path of the gallery's photos.
    pub folder: &'a str,
    pub title: &'a str,
    pub slug: &'a str,
    /// Manifest name override for versioned galleries.
    pub gallery: Option<&'a str>,
}

/// What `init` did, for the CLI report.
#[derive(Debug)]
pub struct InitReport {
    pub manifest_path: PathBuf,
    pub image_dir: PathBuf,
    pub batch_dir: PathBuf,
    pub image_count: usize,
    pub batches_needed: usize,
    pub gallery: String,
    pub overwritten: bool,
}

pub fn init(
    project: &Project,
    config: &InitConfig,
    batch_size: usize,
    reader: &impl MetadataReader,
    request: &InitRequest,
) -> Result<InitReport, InitError> {
    if request.folder.trim().is_empty() {
        return Err(InitError::MissingArgument("folder"));
    }
    if request.title.trim().is_empty() {
        return Err(InitError::MissingArgument("title"));
    }
    if request.slug.trim().is_empty() {
        return Err(InitError::MissingArgument("slug"));
    }

    let gallery_paths = paths::resolve_gallery_paths(
        request.folder,
        request.slug,
        request.gallery,
        project.image_root(),
    );
    if gallery_paths.folder.is_empty() {
        return Err(InitError::MissingArgument("folder"));
    }
    let image_dir = project.resolve(&gallery_paths.image_dir);
    let files = list_images(&image_dir, &config.image_extensions)?;

    tracing::info!(dir = %image_dir.display(), count = files.len(), "extracting EXIF");
    let records = reader.read(&files)?;
    let images = build_images(records)?;

    let manifest: Manifest = Manifest {
        gallery: gallery_paths.manifest_name.clone(),
        title: request.title.to_string(),
        slug: request.slug.to_string(),
        year: chrono::Local::now().year().to_string(),
        source_folder: gallery_paths.source_folder().map(str::to_string),
        images,
        blocks: Vec::new(),
        extra: Map::new(),
    };

    let manifest_path = project.manifest_path(&gallery_paths.manifest_name);
    let batch_dir = project.batch_dir(&gallery_paths.manifest_name);

    fs::create_dir_all(&batch_dir)?;
    let removed = clear_batch_files(&batch_dir)?;
    if removed > 0 {
        tracing::debug!(removed, dir = %batch_dir.display(), "removed stale batch files");
    }

    let overwritten = manifest_path.exists();
    if overwritten {
        tracing::warn!(path = %manifest_path.display(), "overwriting existing manifest");
    }
    manifest::save(&manifest_path, &manifest)?;

    Ok(InitReport {
        image_count: manifest.images.len(),
        batches_needed: manifest.expected_batches(batch_size),
        gallery: manifest.gallery,
        manifest_path,
        image_dir,
        batch_dir,
        overwritten,
    })
}

/// Image files directly inside `dir`, sorted by path.
pub fn list_images(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, InitError> {
    if !dir.is_dir() {
        return Err(InitError::ImageDirNotFound(dir.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if entry.path().is_file()
            && !hidden
            && exif::has_image_extension(entry.path(), extensions)
        {
            files.push(entry.into_path());
        }
    }
    if files.is_empty() {
        return Err(InitError::NoImages(dir.to_path_buf()));
    }
    files.sort();
    Ok(files)
}

/// Turn EXIF records into manifest images, sorted by filename.
pub fn build_images(records: Vec<crate::exif::ExifRecord>) -> Result<Vec<Image>, InitError> {
    let mut images = records
        .into_iter()
        .map(|record| {
            let filename = record.filename().to_string();
            match (record.image_width, record.image_height) {
                (Some(w), Some(h)) if h > 0 => {
                    Ok(Image::new(filename, w, h).with_timestamp(record.date_time_original))
                }
                _ => Err(InitError::MissingDimensions(filename)),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    images.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(images)
}

/// Delete `batch-*.json` files left over from an earlier review round.
fn clear_batch_files(dir: &Path) -> Result<usize, InitError> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if naming::parse_batch_filename(&name.to_string_lossy()).is_some() {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

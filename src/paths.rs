//! Gallery path resolution.
//!
//! A gallery is addressed by two names that usually coincide but don't have to:
//!
//! - the **folder**: the directory its photos live in
//!   (`src/assets/images/photos/<folder>`), and
//! - the **manifest name**: the stem of `<manifest_dir>/<name>.json`, which is
//!   also the batch directory and data file name.
//!
//! Versioned galleries (`merida-v4` built from the `merida-2026` photos) are the
//! reason they differ; the manifest then records the folder as `sourceFolder`.

use crate::config::PathsConfig;
use std::path::{Path, PathBuf};

/// Folder name and image directory derived from an `init` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryFolder {
    pub folder: String,
    pub image_dir: String,
}

/// Everything `init` needs to know about where a gallery lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryPaths {
    pub folder: String,
    pub image_dir: String,
    pub manifest_name: String,
}

impl GalleryPaths {
    /// The folder to record as `sourceFolder`, if the manifest name differs from it.
    pub fn source_folder(&self) -> Option<&str> {
        (self.folder != self.manifest_name).then_some(self.folder.as_str())
    }
}

/// Resolve an `init` argument that is either a bare folder name or a path.
///
/// - `"merida-2026"` → folder `merida-2026`, image dir `<image_root>/merida-2026`
/// - `"photos/merida-2026"` → folder `merida-2026`, image dir as given
/// - `"photos/merida-2026/"` → same as without the trailing slash
pub fn resolve_gallery_folder(input: &str, image_root: &str) -> GalleryFolder {
    let cleaned = input.trim_end_matches('/');

    if let Some((_, last)) = cleaned.rsplit_once('/') {
        return GalleryFolder {
            folder: last.to_string(),
            image_dir: cleaned.to_string(),
        };
    }

    GalleryFolder {
        folder: cleaned.to_string(),
        image_dir: format!("{}/{}", image_root.trim_end_matches('/'), cleaned),
    }
}

/// Resolve folder, image directory and manifest name for `init`.
///
/// An explicit `gallery_name` wins; otherwise the gallery's slug names the
/// manifest, whatever folder the photos come from.
pub fn resolve_gallery_paths(
    input: &str,
    slug: &str,
    gallery_name: Option<&str>,
    image_root: &str,
) -> GalleryPaths {
    let GalleryFolder { folder, image_dir } = resolve_gallery_folder(input, image_root);
    let manifest_name = gallery_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(slug)
        .to_string();
    GalleryPaths {
        folder,
        image_dir,
        manifest_name,
    }
}

/// The project's file locations, anchored at the project root.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    paths: PathsConfig,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, paths: PathsConfig) -> Self {
        Self {
            root: root.into(),
            paths,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Anchor a configured path at the project root (absolute paths pass through).
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    pub fn manifest_path(&self, gallery: &str) -> PathBuf {
        self.resolve(&self.paths.manifest_dir)
            .join(format!("{gallery}.json"))
    }

    pub fn batch_dir(&self, gallery: &str) -> PathBuf {
        self.resolve(&self.paths.batch_root).join(gallery)
    }

    pub fn data_file(&self, gallery: &str) -> PathBuf {
        self.resolve(&self.paths.data_dir).join(format!("{gallery}.ts"))
    }

    pub fn page_dir(&self, slug: &str) -> PathBuf {
        self.resolve(&self.paths.page_root).join(slug)
    }

    pub fn image_root(&self) -> &str {
        &self.paths.image_root
    }

    /// Resolve a `validate` argument: a path to a `.json` file, or a gallery name.
    pub fn manifest_arg(&self, input: &str) -> PathBuf {
        if input.ends_with(".json") || input.contains('/') {
            self.resolve(input)
        } else {
            self.manifest_path(input)
        }
    }
}

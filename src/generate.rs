//! Page and data file generation.
//!
//! Final stage of the gallery pipeline. Takes a validated manifest and writes
//! the files the website build consumes:
//!
//! ```text
//! src/
//! ├── data/
//! │   └── merida.ts              # title + chapter list
//! └── pages/photographing/
//!     └── merida/                # manifest slug
//!         ├── index.astro        # root chapter
//!         ├── uxmal.astro        # one page per further chapter
//!         └── haciendas.astro
//! ```
//!
//! ## Page Files
//!
//! Each page imports exactly the photos its chapter shows (as `img000`,
//! `img001`, ... in first-use order), the layout components its blocks use, and
//! renders one component per block followed by the bottom chapter navigation.
//!
//! The first FullBleed/WideImage photo of the first chapter is marked
//! `priority={true}` unless some block already asked for priority loading, so
//! the top of the gallery is never lazy-loaded.
//!
//! ## Escaping
//!
//! Text written into TypeScript goes through JSON string literals, which are
//! valid TS literals. Attribute values escape `&` and `"`.

use crate::chapters::{self, Chapter, Chapters, Navigation};
use crate::config::GenerateConfig;
use crate::manifest::{self, Block, BlockProps, Layout, Manifest, ManifestError};
use crate::naming;
use crate::paths::Project;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Manifest not found: {0}")]
    ManifestNotFound(PathBuf),
    #[error("Manifest {path} is not in canonical form ({source}). Run validate first.")]
    NotCanonical {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Manifest(ManifestError),
    #[error("Manifest has no blocks. Run batch reviews and merge first.")]
    EmptyBlocks,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ManifestError> for GenerateError {
    fn from(e: ManifestError) -> Self {
        match e {
            ManifestError::NotFound(path) => GenerateError::ManifestNotFound(path),
            ManifestError::Parse { path, source } => GenerateError::NotCanonical { path, source },
            other => GenerateError::Manifest(other),
        }
    }
}

/// Path from a generated page back to `src/`.
const SRC_FROM_PAGE: &str = "../../..";

/// A block rendered as a comment instead of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderWarning {
    UnknownLayout(String),
    MissingImage(Layout),
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderWarning::UnknownLayout(name) => write!(f, "Unknown layout: {name}"),
            RenderWarning::MissingImage(layout) => write!(f, "{layout} block has no image"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPage {
    pub chapter: String,
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct GenerateReport {
    pub data_file: PathBuf,
    pub pages: Vec<GeneratedPage>,
    /// Whether the manifest declares chapters.
    pub explicit_chapters: bool,
    pub block_count: usize,
    /// Public URL of the gallery.
    pub url: String,
    pub warnings: Vec<RenderWarning>,
    pub duplicate_slugs: Vec<String>,
}

/// Generate the data file and every chapter page of `gallery`.
pub fn generate(
    project: &Project,
    config: &GenerateConfig,
    gallery: &str,
) -> Result<GenerateReport, GenerateError> {
    let manifest: Manifest = manifest::load(&project.manifest_path(gallery))?;
    if manifest.blocks.is_empty() {
        return Err(GenerateError::EmptyBlocks);
    }

    let chapters = chapters::segment(
        &manifest.blocks,
        &manifest.title,
        &config.implicit_chapter_name,
    );

    let data_file = project.data_file(gallery);
    if let Some(parent) = data_file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&data_file, render_data_file(&manifest.title, &chapters))?;
    tracing::debug!(path = %data_file.display(), "wrote data file");

    let page_dir = project.page_dir(&manifest.slug);
    fs::create_dir_all(&page_dir)?;

    let ctx = PageContext {
        data_module: gallery,
        image_folder: manifest.image_folder(),
        image_import_root: &config.image_import_root,
    };
    let mut pages = Vec::with_capacity(chapters.list.len());
    let mut warnings = Vec::new();
    for (i, chapter) in chapters.list.iter().enumerate() {
        let nav = chapters::navigation(&chapters.list, i);
        let page = render_page(chapter, nav, i == 0, &ctx);
        for warning in &page.warnings {
            tracing::warn!(chapter = %chapter.name, "{warning}");
        }
        warnings.extend(page.warnings);

        let path = page_dir.join(format!("{}.astro", chapter.page_stem()));
        fs::write(&path, page.content)?;
        tracing::debug!(path = %path.display(), "wrote page");
        pages.push(GeneratedPage {
            chapter: chapter.name.clone(),
            path,
        });
    }

    Ok(GenerateReport {
        data_file,
        pages,
        explicit_chapters: chapters.explicit,
        block_count: manifest.blocks.len(),
        url: format!(
            "{}/{}/",
            config.url_prefix.trim_end_matches('/'),
            manifest.slug
        ),
        warnings,
        duplicate_slugs: chapters.duplicate_slugs,
    })
}

// =============================================================================
// Data file
// =============================================================================

/// Render `<gallery>.ts`. The chapter list is empty for unchaptered galleries.
pub fn render_data_file(title: &str, chapters: &Chapters) -> String {
    let entries: Vec<String> = if chapters.explicit {
        chapters
            .list
            .iter()
            .map(|c| {
                format!(
                    "  {{ name: {}, href: {} }},",
                    js_string(&c.name),
                    js_string(c.href())
                )
            })
            .collect()
    } else {
        Vec::new()
    };
    format!(
        "import type {{ Chapter }} from \"../consts\";\n\n\
         export const title = {};\n\
         export const chapters: Chapter[] = [\n{}\n];\n",
        js_string(title),
        entries.join("\n")
    )
}

// =============================================================================
// Page files
// =============================================================================

/// Gallery-wide inputs to page rendering.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// Module name of the data file (`src/data/<name>.ts`).
    pub data_module: &'a str,
    /// Directory under the image root holding the photos.
    pub image_folder: &'a str,
    pub image_import_root: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub content: String,
    pub warnings: Vec<RenderWarning>,
}

/// Render one chapter page.
pub fn render_page(
    chapter: &Chapter<'_>,
    nav: Navigation<'_>,
    is_first: bool,
    ctx: &PageContext<'_>,
) -> RenderedPage {
    let filenames = distinct_images(&chapter.blocks);
    let vars: HashMap<&str, String> = filenames
        .iter()
        .enumerate()
        .map(|(i, f)| (*f, naming::import_name(i)))
        .collect();

    let forced = if is_first { priority_target(&chapter.blocks, &vars) } else { None };

    let mut fragments = Vec::new();
    let mut used = HashSet::new();
    let mut warnings = Vec::new();
    for (i, block) in chapter.blocks.iter().enumerate() {
        let Some(rendered) = render_block(block, &vars, forced == Some(i)) else {
            continue;
        };
        used.extend(rendered.component);
        warnings.extend(rendered.warning);
        fragments.push(rendered.code);
    }

    let components: Vec<&str> = Layout::KNOWN
        .iter()
        .filter_map(component_name)
        .filter(|c| used.contains(c))
        .collect();
    let component_import = if components.is_empty() {
        String::new()
    } else {
        format!(
            "import {{\n  {}\n}} from \"{SRC_FROM_PAGE}/components/photos\";\n",
            components.join(",\n  ")
        )
    };

    let image_imports: Vec<String> = filenames
        .iter()
        .map(|f| {
            let source = format!(
                "{}/{}/{}",
                ctx.image_import_root.trim_end_matches('/'),
                ctx.image_folder,
                f
            );
            format!("import {} from {};", vars[f], js_string(&source))
        })
        .collect();

    let data_module = js_string(&format!("{SRC_FROM_PAGE}/data/{}", ctx.data_module));
    let content = format!(
        r#"---
import BaseLayout from "{SRC_FROM_PAGE}/layouts/BaseLayout.astro";
import BottomNavigation from "{SRC_FROM_PAGE}/components/BottomNavigation.svelte";
{component_import}import {{ title, chapters }} from {data_module};
import {{ getPageTitle }} from "{SRC_FROM_PAGE}/lib/navigation";

const pageTitle = getPageTitle(title, Astro.url.pathname, chapters);

{imports}
---

<BaseLayout title={{pageTitle}} navTitle={{title}} chapters={{chapters}}>
{blocks}

  <BottomNavigation {nav} />
</BaseLayout>
"#,
        imports = image_imports.join("\n"),
        blocks = fragments.join("\n\n"),
        nav = navigation_props(nav),
    );

    RenderedPage { content, warnings }
}

/// Component rendering `layout`, in import order; `None` for structural or
/// unknown layouts.
fn component_name(layout: &Layout) -> Option<&'static str> {
    match layout {
        Layout::FullBleed => Some("FullBleedImage"),
        Layout::WideImage => Some("WideImage"),
        Layout::TwoUp => Some("TwoUpLayout"),
        Layout::ThreeUp => Some("ThreeUpLayout"),
        Layout::FourUp => Some("FourUpGrid"),
        Layout::SplitLayout => Some("SplitLayout"),
        Layout::OffsetImage => Some("OffsetImage"),
        Layout::InsetImage => Some("InsetImage"),
        Layout::Spacer => Some("Spacer"),
        Layout::Chapter | Layout::Unknown(_) => None,
    }
}

/// Every image referenced by `blocks`, first use first.
fn distinct_images<'b>(blocks: &[&'b Block]) -> Vec<&'b str> {
    let mut seen = HashSet::new();
    blocks
        .iter()
        .copied()
        .flat_map(|b| &b.images)
        .map(String::as_str)
        .filter(|f| seen.insert(*f))
        .collect()
}

/// Index of the block to force eager loading on, if no block asks for it.
fn priority_target(blocks: &[&Block], vars: &HashMap<&str, String>) -> Option<usize> {
    let renders_image = |b: &Block| {
        b.images
            .first()
            .is_some_and(|f| vars.contains_key(f.as_str()))
    };
    if blocks
        .iter()
        .copied()
        .any(|b| b.props().priority() && renders_image(b))
    {
        return None;
    }
    blocks.iter().copied().position(|b| {
        matches!(b.layout, Layout::FullBleed | Layout::WideImage) && renders_image(b)
    })
}

struct Rendered {
    code: String,
    component: Option<&'static str>,
    warning: Option<RenderWarning>,
}

impl Rendered {
    fn component(name: &'static str, code: String) -> Self {
        Self {
            code,
            component: Some(name),
            warning: None,
        }
    }

    fn placeholder(code: String, warning: RenderWarning) -> Self {
        Self {
            code,
            component: None,
            warning: Some(warning),
        }
    }
}

fn render_block(
    block: &Block,
    vars: &HashMap<&str, String>,
    force_priority: bool,
) -> Option<Rendered> {
    let Some(component) = component_name(&block.layout) else {
        if block.layout == Layout::Chapter {
            return None;
        }
        return Some(Rendered::placeholder(
            format!("  {{/* Unknown layout: {} */}}", comment_text(block.layout.as_str())),
            RenderWarning::UnknownLayout(block.layout.to_string()),
        ));
    };

    let rendered = match block.props() {
        BlockProps::Single { priority } => {
            single_image(component, block, vars, String::new(), priority || force_priority)
        }
        BlockProps::Offset {
            align,
            size,
            priority,
        } => {
            let attrs = format!("{}{}", opt_attr("align", align), opt_attr("size", size));
            single_image(component, block, vars, attrs, priority)
        }
        BlockProps::Grid => Rendered::component(
            component,
            format!("  <{component} images={{[\n{}\n  ]}} />", image_list(block, vars)),
        ),
        BlockProps::Split { ratio } => Rendered::component(
            component,
            format!(
                "  <{component} images={{[\n{}\n  ]}}{} />",
                image_list(block, vars),
                opt_attr("ratio", ratio)
            ),
        ),
        BlockProps::Spacer { size } => {
            Rendered::component(component, format!("  <{component}{} />", opt_attr("size", size)))
        }
        BlockProps::Chapter { .. } | BlockProps::Unknown => return None,
    };
    Some(rendered)
}

fn single_image(
    component: &'static str,
    block: &Block,
    vars: &HashMap<&str, String>,
    attrs: String,
    priority: bool,
) -> Rendered {
    match block.images.first().and_then(|f| vars.get(f.as_str())) {
        Some(var) => {
            let priority = if priority { " priority={true}" } else { "" };
            Rendered::component(
                component,
                format!("  <{component} src={{{var}}} alt=\"\"{attrs}{priority} />"),
            )
        }
        None => Rendered::placeholder(
            format!("  {{/* {} block without an image */}}", block.layout),
            RenderWarning::MissingImage(block.layout.clone()),
        ),
    }
}

fn image_list(block: &Block, vars: &HashMap<&str, String>) -> String {
    block
        .images
        .iter()
        .filter_map(|f| vars.get(f.as_str()))
        .map(|var| format!("    {{ src: {var}, alt: \"\" }},"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn navigation_props(nav: Navigation<'_>) -> String {
    let mut props = Vec::new();
    if let Some(prev) = nav.prev {
        props.push(format!("prevHref=\"{}\"", escape_attr(prev)));
    }
    if let Some(next) = nav.next {
        props.push(format!("nextHref=\"{}\"", escape_attr(next)));
    }
    props.push("currentPath={Astro.url.pathname}".to_string());
    props.push("chapters={chapters}".to_string());
    props.push("client:load".to_string());
    props.join(" ")
}

fn opt_attr(name: &str, value: Option<String>) -> String {
    value
        .map(|v| format!(" {name}=\"{}\"", escape_attr(&v)))
        .unwrap_or_default()
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// A JSON string literal, also a valid TS string literal.
fn js_string(value: &str) -> String {
    Value::from(value).to_string()
}

/// Keep text from closing a JSX comment early.
fn comment_text(value: &str) -> String {
    value.replace("*/", "* /")
}

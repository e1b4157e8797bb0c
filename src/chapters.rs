//! Chapter segmentation and navigation.
//!
//! A gallery page can be split into chapters by placing `Chapter` blocks in
//! the block list. Each chapter becomes its own page:
//!
//! ```text
//! blocks:   FullBleed  TwoUp  [Chapter uxmal]  Wide  Spacer  [Chapter haciendas]  Wide
//!           \_________/                        \__________/                        \__/
//! chapters:  "Part I" (/)                        uxmal                             haciendas
//! pages:     index.astro                         uxmal.astro                       haciendas.astro
//! ```
//!
//! Blocks before the first `Chapter` form an implicit root chapter. Without any
//! `Chapter` blocks the whole gallery is one root chapter named after its title.
//! Chapters are derived on every run and never stored.

use crate::manifest::{Block, BlockProps, Layout};
use crate::naming;
use std::collections::HashSet;

/// Slug (and href) of the chapter served at the gallery's own URL.
pub const ROOT_SLUG: &str = "/";

#[derive(Debug, Clone, PartialEq)]
pub struct Chapter<'a> {
    pub name: String,
    /// `/` for the root chapter, a bare path segment otherwise.
    pub slug: String,
    pub blocks: Vec<&'a Block>,
}

impl Chapter<'_> {
    pub fn is_root(&self) -> bool {
        self.slug == ROOT_SLUG
    }

    /// Link target relative to the gallery URL.
    pub fn href(&self) -> &str {
        &self.slug
    }

    /// Page file stem: `index` for the root chapter, the slug otherwise.
    pub fn page_stem(&self) -> &str {
        if self.is_root() { "index" } else { &self.slug }
    }
}

/// Result of [`segment`].
#[derive(Debug, Clone, PartialEq)]
pub struct Chapters<'a> {
    pub list: Vec<Chapter<'a>>,
    /// Whether the blocks contained at least one `Chapter` block.
    pub explicit: bool,
    /// Slugs used by more than one chapter; their pages overwrite each other.
    pub duplicate_slugs: Vec<String>,
}

/// Split `blocks` into chapters at every `Chapter` block.
///
/// `title` names the single chapter of an unchaptered gallery;
/// `implicit_name` names the chapter holding blocks before the first
/// `Chapter` block.
pub fn segment<'a>(blocks: &'a [Block], title: &str, implicit_name: &str) -> Chapters<'a> {
    let mut list: Vec<Chapter<'a>> = Vec::new();
    let mut current: Option<Chapter<'a>> = None;
    let mut leading: Vec<&'a Block> = Vec::new();
    let mut chapter_count = 0;

    for block in blocks {
        if block.layout == Layout::Chapter {
            chapter_count += 1;
            list.extend(current.take());
            current = Some(open_chapter(block, chapter_count));
        } else if let Some(chapter) = current.as_mut() {
            chapter.blocks.push(block);
        } else {
            leading.push(block);
        }
    }
    list.extend(current);

    let explicit = !list.is_empty();
    if !explicit {
        list.push(Chapter {
            name: title.to_string(),
            slug: ROOT_SLUG.to_string(),
            blocks: leading,
        });
    } else if !leading.is_empty() {
        list.insert(
            0,
            Chapter {
                name: implicit_name.to_string(),
                slug: ROOT_SLUG.to_string(),
                blocks: leading,
            },
        );
    }

    let mut seen = HashSet::new();
    let mut duplicate_slugs = Vec::new();
    for chapter in &list {
        if !seen.insert(chapter.slug.as_str()) && !duplicate_slugs.contains(&chapter.slug) {
            tracing::warn!(slug = %chapter.slug, "several chapters share one slug; later pages overwrite earlier ones");
            duplicate_slugs.push(chapter.slug.clone());
        }
    }

    Chapters {
        list,
        explicit,
        duplicate_slugs,
    }
}

/// Build the chapter opened by the `n`-th `Chapter` block (1-based).
fn open_chapter(block: &Block, n: usize) -> Chapter<'_> {
    let (name, slug) = match block.props() {
        BlockProps::Chapter { name, slug } => (name, slug),
        _ => (None, None),
    };

    let slug = match slug {
        Some(raw) => normalize_slug(&raw, n),
        None => {
            let derived = name.as_deref().map(naming::sanitize_slug).unwrap_or_default();
            let slug = if derived.is_empty() {
                format!("chapter-{n}")
            } else {
                derived
            };
            tracing::warn!(chapter = n, %slug, "chapter has no slug; derived one");
            slug
        }
    };

    let name = match name {
        Some(name) => name,
        None => {
            let name = if slug == ROOT_SLUG {
                format!("Chapter {n}")
            } else {
                slug.clone()
            };
            tracing::warn!(chapter = n, %name, "chapter has no name");
            name
        }
    };

    Chapter {
        name,
        slug,
        blocks: Vec::new(),
    }
}

/// Strip surrounding slashes; nothing left means the root.
///
/// The slug names a page file, so one that isn't a single path segment
/// (`ruins/north`, `../x`) is flattened with [`naming::sanitize_slug`].
fn normalize_slug(raw: &str, n: usize) -> String {
    let trimmed = raw.trim().trim_matches('/').trim();
    if trimmed.is_empty() {
        return ROOT_SLUG.to_string();
    }
    if is_path_segment(trimmed) {
        return trimmed.to_string();
    }
    let flat = naming::sanitize_slug(trimmed);
    let slug = if flat.is_empty() {
        format!("chapter-{n}")
    } else {
        flat
    };
    tracing::warn!(chapter = n, raw, %slug, "chapter slug is not a single path segment; flattened");
    slug
}

fn is_path_segment(slug: &str) -> bool {
    !slug.contains(['/', '\\']) && slug != "." && slug != ".."
}

/// Links to the neighbouring chapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Navigation<'c> {
    pub prev: Option<&'c str>,
    pub next: Option<&'c str>,
}

/// Prev/next hrefs for the chapter at `index`.
pub fn navigation<'c>(chapters: &'c [Chapter<'_>], index: usize) -> Navigation<'c> {
    Navigation {
        prev: index
            .checked_sub(1)
            .and_then(|i| chapters.get(i))
            .map(Chapter::href),
        next: chapters.get(index + 1).map(Chapter::href),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn names<'a>(chapters: &'a Chapters) -> Vec<&'a str> {
        chapters.list.iter().map(|c| c.name.as_str()).collect()
    }

    fn slugs<'a>(chapters: &'a Chapters) -> Vec<&'a str> {
        chapters.list.iter().map(|c| c.slug.as_str()).collect()
    }

    fn three_chapter_blocks() -> Vec<Block> {
        vec![
            block(Layout::FullBleed, &["a.jpeg"]),
            block(Layout::TwoUp, &["b.jpeg", "c.jpeg"]),
            chapter_block("Uxmal", "uxmal"),
            block(Layout::WideImage, &["d.jpeg"]),
            block(Layout::Spacer, &[]),
            chapter_block("Haciendas", "haciendas"),
            block(Layout::WideImage, &["e.jpeg"]),
        ]
    }

    // =========================================================================
    // segment()
    // =========================================================================

    #[test]
    fn leading_blocks_form_implicit_root_chapter() {
        let blocks = three_chapter_blocks();
        let chapters = segment(&blocks, "MÉRIDA", "Part I");

        assert!(chapters.explicit);
        assert_eq!(names(&chapters), vec!["Part I", "Uxmal", "Haciendas"]);
        assert_eq!(slugs(&chapters), vec!["/", "uxmal", "haciendas"]);
        let counts: Vec<usize> = chapters.list.iter().map(|c| c.blocks.len()).collect();
        assert_eq!(counts, vec![2, 2, 1]);
    }

    #[test]
    fn chapter_blocks_are_not_chapter_content() {
        let blocks = three_chapter_blocks();
        let chapters = segment(&blocks, "MÉRIDA", "Part I");
        assert!(
            chapters
                .list
                .iter()
                .flat_map(|c| &c.blocks)
                .all(|b| b.layout != Layout::Chapter)
        );
    }

    #[test]
    fn no_chapter_blocks_means_one_root_chapter_named_after_title() {
        let blocks = vec![
            block(Layout::WideImage, &["a.jpeg"]),
            block(Layout::WideImage, &["b.jpeg"]),
        ];
        let chapters = segment(&blocks, "CABO 2025", "Part I");
        assert!(!chapters.explicit);
        assert_eq!(names(&chapters), vec!["CABO 2025"]);
        assert_eq!(slugs(&chapters), vec!["/"]);
        assert_eq!(chapters.list[0].blocks.len(), 2);
    }

    #[test]
    fn no_implicit_chapter_without_leading_blocks() {
        let blocks = vec![
            chapter_block("Intro", "/"),
            block(Layout::WideImage, &["a.jpeg"]),
            chapter_block("Coast", "coast"),
            block(Layout::WideImage, &["b.jpeg"]),
        ];
        let chapters = segment(&blocks, "T", "Part I");
        assert_eq!(names(&chapters), vec!["Intro", "Coast"]);
        assert_eq!(slugs(&chapters), vec!["/", "coast"]);
        assert!(chapters.duplicate_slugs.is_empty());
    }

    #[test]
    fn implicit_chapter_name_is_configurable() {
        let blocks = three_chapter_blocks();
        let chapters = segment(&blocks, "T", "Prologue");
        assert_eq!(chapters.list[0].name, "Prologue");
    }

    #[test]
    fn empty_chapter_is_kept() {
        let blocks = vec![chapter_block("A", "a"), chapter_block("B", "b")];
        let chapters = segment(&blocks, "T", "Part I");
        assert_eq!(slugs(&chapters), vec!["a", "b"]);
        assert!(chapters.list[0].blocks.is_empty());
    }

    #[test]
    fn slug_slashes_are_trimmed() {
        let blocks = vec![chapter_block("Uxmal", " /uxmal/ "), chapter_block("Home", "//")];
        let chapters = segment(&blocks, "T", "Part I");
        assert_eq!(slugs(&chapters), vec!["uxmal", "/"]);
    }

    #[test]
    fn nested_slugs_are_flattened() {
        let blocks = vec![
            chapter_block("North", "ruins/north"),
            chapter_block("Escape", "../x"),
            chapter_block("Dots", ".."),
            chapter_block("Windows", "a\\b"),
        ];
        let chapters = segment(&blocks, "T", "Part I");
        assert_eq!(slugs(&chapters), vec!["ruins-north", "x", "chapter-3", "a-b"]);
    }

    #[test]
    fn missing_slug_is_derived_from_name() {
        let blocks = vec![
            Block::new(Layout::Chapter, vec![]).with_prop("name", "The Haciendas"),
            Block::new(Layout::Chapter, vec![]).with_prop("name", "日本"),
        ];
        let chapters = segment(&blocks, "T", "Part I");
        assert_eq!(slugs(&chapters), vec!["the-haciendas", "chapter-2"]);
    }

    #[test]
    fn missing_name_falls_back_to_slug() {
        let blocks = vec![
            Block::new(Layout::Chapter, vec![]).with_prop("slug", "uxmal"),
            Block::new(Layout::Chapter, vec![]).with_prop("slug", "/"),
            Block::new(Layout::Chapter, vec![]),
        ];
        let chapters = segment(&blocks, "T", "Part I");
        assert_eq!(names(&chapters), vec!["uxmal", "Chapter 2", "chapter-3"]);
    }

    #[test]
    fn duplicate_slugs_are_reported_once() {
        let blocks = vec![
            block(Layout::WideImage, &["a.jpeg"]),
            chapter_block("Root again", "/"),
            chapter_block("X", "x"),
            chapter_block("X2", "x"),
            chapter_block("X3", "x"),
        ];
        let chapters = segment(&blocks, "T", "Part I");
        assert_eq!(chapters.duplicate_slugs, vec!["/", "x"]);
        assert_eq!(chapters.list.len(), 5);
    }

    // =========================================================================
    // Chapter
    // =========================================================================

    #[test]
    fn page_stem_and_href() {
        let blocks = three_chapter_blocks();
        let chapters = segment(&blocks, "T", "Part I");
        let stems: Vec<&str> = chapters.list.iter().map(Chapter::page_stem).collect();
        assert_eq!(stems, vec!["index", "uxmal", "haciendas"]);
        assert_eq!(chapters.list[0].href(), "/");
        assert_eq!(chapters.list[1].href(), "uxmal");
    }

    // =========================================================================
    // navigation()
    // =========================================================================

    #[test]
    fn first_chapter_has_only_next() {
        let blocks = three_chapter_blocks();
        let chapters = segment(&blocks, "T", "Part I");
        let nav = navigation(&chapters.list, 0);
        assert_eq!(nav.prev, None);
        assert_eq!(nav.next, Some("uxmal"));
    }

    #[test]
    fn middle_chapter_has_both() {
        let blocks = three_chapter_blocks();
        let chapters = segment(&blocks, "T", "Part I");
        let nav = navigation(&chapters.list, 1);
        assert_eq!(nav.prev, Some("/"));
        assert_eq!(nav.next, Some("haciendas"));
    }

    #[test]
    fn last_chapter_has_only_prev() {
        let blocks = three_chapter_blocks();
        let chapters = segment(&blocks, "T", "Part I");
        let nav = navigation(&chapters.list, 2);
        assert_eq!(nav.prev, Some("uxmal"));
        assert_eq!(nav.next, None);
    }

    #[test]
    fn single_chapter_has_no_navigation() {
        let blocks = vec![block(Layout::WideImage, &["a.jpeg"])];
        let chapters = segment(&blocks, "All", "Part I");
        assert_eq!(navigation(&chapters.list, 0), Navigation::default());
    }
}

//! CLI output formatting for every command.
//!
//! # Report-First Display
//!
//! Each command prints what it learned about the gallery first (batches,
//! blocks, chapters) and where it wrote things second. Paths are shown relative
//! to the project root when they live inside it.
//!
//! # Output Format
//!
//! ## Init
//!
//! ```text
//! Gallery merida (24 photos)
//!     Images: src/assets/images/photos/merida-2026
//!     Manifest: src/data/gallery-manifests/merida.json
//!     Batches: /tmp/gallery-batches/merida (3 needed)
//! ```
//!
//! ## Merge
//!
//! ```text
//! Batches (3/3)
//! 000 batch-00.json: 5 blocks (images 0-7)
//! 001 batch-01.json: 6 blocks (images 8-15)
//! 002 batch-02.json: 4 blocks (images 16-23)
//!
//! Merged 15 blocks into src/data/gallery-manifests/merida.json
//!
//! Layout distribution
//!     WideImage: 8
//!     FullBleed: 4
//!     TwoUp: 3
//!
//! Single-image layouts: 80% (target: 80%+)
//! ```
//!
//! ## Validate
//!
//! ```text
//! Fixed
//!     Block 3 (TwoUp): type→layout, index→filename
//! Duplicates
//!     Block 7 (WideImage): DSCF004.jpeg
//!
//! Fixed 1 block, wrote src/data/gallery-manifests/merida.json
//!
//! Layout distribution
//!     WideImage: 8
//! ```
//!
//! ## Generate
//!
//! ```text
//! Data file → src/data/merida.ts
//! 001 Part I → src/pages/photographing/merida/index.astro
//! 002 Uxmal → src/pages/photographing/merida/uxmal.astro
//!
//! Gallery generated: /photographing/merida/
//! Chapters: Part I, Uxmal
//! Total blocks: 15
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::generate::GenerateReport;
use crate::init::InitReport;
use crate::merge::{Composition, LayoutStats, MergeReport};
use crate::naming;
use crate::normalize::{BlockFixes, IndexedIssue};
use crate::validate::ValidateReport;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Show `path` relative to `root` when it lives inside it.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn fixes_section(fixed: &[BlockFixes]) -> Vec<String> {
    if fixed.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Fixed".to_string()];
    for f in fixed {
        let labels: Vec<String> = f.fixes.iter().map(ToString::to_string).collect();
        lines.push(format!(
            "{}Block {} ({}): {}",
            indent(1),
            f.index,
            f.layout,
            labels.join(", ")
        ));
    }
    lines
}

fn issues_section(issues: &[IndexedIssue]) -> Vec<String> {
    if issues.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Issues".to_string()];
    for i in issues {
        lines.push(format!("{}Block {}: {}", indent(1), i.index, i.issue));
    }
    lines
}

fn distribution_section(stats: &LayoutStats) -> Vec<String> {
    let mut lines = vec!["Layout distribution".to_string()];
    for (layout, count) in stats.distribution() {
        lines.push(format!("{}{}: {}", indent(1), layout, count));
    }
    lines
}

fn composition_section(composition: &Composition) -> Vec<String> {
    let Some(percent) = composition.single_percent else {
        return Vec::new();
    };
    let mut lines = vec![format!(
        "Single-image layouts: {}% (target: {}%+)",
        percent, composition.target
    )];
    for warning in &composition.warnings {
        lines.push(format!("{}{}", indent(1), warning));
    }
    lines
}

/// Join sections with blank lines, skipping empty ones.
fn join_sections(sections: Vec<Vec<String>>) -> Vec<String> {
    let mut lines = Vec::new();
    for section in sections.into_iter().filter(|s| !s.is_empty()) {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(section);
    }
    lines
}

// ============================================================================
// Init
// ============================================================================

pub fn format_init_output(report: &InitReport, root: &Path) -> Vec<String> {
    let mut manifest_line = format!(
        "{}Manifest: {}",
        indent(1),
        display_path(&report.manifest_path, root)
    );
    if report.overwritten {
        manifest_line.push_str(" (overwritten)");
    }
    vec![
        format!("Gallery {} ({} photos)", report.gallery, report.image_count),
        format!(
            "{}Images: {}",
            indent(1),
            display_path(&report.image_dir, root)
        ),
        manifest_line,
        format!(
            "{}Batches: {} ({} needed)",
            indent(1),
            display_path(&report.batch_dir, root),
            report.batches_needed
        ),
    ]
}

pub fn print_init_output(report: &InitReport, root: &Path) {
    for line in format_init_output(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Merge
// ============================================================================

pub fn format_merge_output(report: &MergeReport, root: &Path) -> Vec<String> {
    let mut batches = vec![format!(
        "Batches ({}/{})",
        report.batches.len(),
        report.expected_batches
    )];
    for b in &report.batches {
        let range = match (b.start_image, b.end_image) {
            (Some(start), Some(end)) => format!(" (images {start}-{end})"),
            _ => String::new(),
        };
        batches.push(format!(
            "{} {}: {}{}",
            format_index(b.index as usize),
            b.name,
            plural(b.block_count, "block"),
            range
        ));
    }
    if !report.missing_batches.is_empty() {
        let missing: Vec<String> = report
            .missing_batches
            .iter()
            .map(|&i| naming::batch_filename(i))
            .collect();
        batches.push(format!(
            "{}Missing: {} (some images will not have layout blocks)",
            indent(1),
            missing.join(", ")
        ));
    }
    if !report.duplicate_indices.is_empty() {
        let dups: Vec<String> = report
            .duplicate_indices
            .iter()
            .map(ToString::to_string)
            .collect();
        batches.push(format!("{}Shared index: {}", indent(1), dups.join(", ")));
    }

    join_sections(vec![
        batches,
        fixes_section(&report.fixed),
        issues_section(&report.issues),
        vec![format!(
            "Merged {} into {}",
            plural(report.block_count, "block"),
            display_path(&report.manifest_path, root)
        )],
        distribution_section(&report.stats),
        composition_section(&report.composition),
    ])
}

pub fn print_merge_output(report: &MergeReport, root: &Path) {
    for line in format_merge_output(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Validate
// ============================================================================

pub fn format_validate_output(report: &ValidateReport, root: &Path) -> Vec<String> {
    let duplicates = if report.duplicates.is_empty() {
        Vec::new()
    } else {
        let mut lines = vec!["Duplicates".to_string()];
        for d in &report.duplicates {
            lines.push(format!(
                "{}Block {} ({}): {}",
                indent(1),
                d.block_index,
                d.layout,
                d.image
            ));
        }
        lines
    };

    let status = if report.written {
        format!(
            "Fixed {}, wrote {}",
            plural(report.fixed.len(), "block"),
            display_path(&report.manifest_path, root)
        )
    } else {
        format!(
            "Manifest valid: {}, no fixes needed",
            plural(report.block_count, "block")
        )
    };

    join_sections(vec![
        fixes_section(&report.fixed),
        issues_section(&report.issues),
        duplicates,
        vec![status],
        distribution_section(&report.stats),
    ])
}

pub fn print_validate_output(report: &ValidateReport, root: &Path) {
    for line in format_validate_output(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate
// ============================================================================

pub fn format_generate_output(report: &GenerateReport, root: &Path) -> Vec<String> {
    let mut files = vec![format!(
        "Data file \u{2192} {}",
        display_path(&report.data_file, root)
    )];
    for (i, page) in report.pages.iter().enumerate() {
        files.push(format!(
            "{} {} \u{2192} {}",
            format_index(i + 1),
            page.chapter,
            display_path(&page.path, root)
        ));
    }

    let mut warnings = Vec::new();
    if !report.warnings.is_empty() || !report.duplicate_slugs.is_empty() {
        warnings.push("Warnings".to_string());
        for w in &report.warnings {
            warnings.push(format!("{}{}", indent(1), w));
        }
        for slug in &report.duplicate_slugs {
            warnings.push(format!("{}Chapter slug {slug} used more than once", indent(1)));
        }
    }

    let mut summary = vec![format!("Gallery generated: {}", report.url)];
    if report.explicit_chapters {
        let names: Vec<&str> = report.pages.iter().map(|p| p.chapter.as_str()).collect();
        summary.push(format!("Chapters: {}", names.join(", ")));
    }
    summary.push(format!("Total blocks: {}", report.block_count));

    join_sections(vec![files, warnings, summary])
}

pub fn print_generate_output(report: &GenerateReport, root: &Path) {
    for line in format_generate_output(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

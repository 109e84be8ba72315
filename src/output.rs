//! CLI output formatting for all build stages.
//!
//! # Information-First Display
//!
//! The primary display for every entity (post, image) is its semantic
//! identity: positional index, date, title, URL. Filesystem paths are
//! secondary context on indented `Source:` lines, so the output reads as a
//! content inventory while still pointing back at the file to edit.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Posts
//! 001 2024-10-13 Harbour at dawn → 2024/10/harbour/
//!     Source: posts/2024/10/2024-10-13-harbour.md
//!     2 images, photo layout
//! 002 2024-10-12 A → 2024/10/a/
//!     Source: posts/2024/10/2024-10-12-a.md
//!
//! Site
//!     config.toml
//!     static/
//! ```
//!
//! ## Process
//!
//! ```text
//! 001 static/a.jpg 1600x1200
//!     Variants: 480w, 720w, 1080w
//!     LCP candidate
//! 002 static/logo.svg (no size)
//! Images: 2 processed, 1 reused (3 references)
//! ```
//!
//! ## Build
//!
//! ```text
//! index.html
//! page/2/index.html
//! 2024/10/a/index.html
//! ...
//! Copied 12 files
//! Built 25 posts, 3 pages, 4 images (9 variants) → dist
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::pipeline::{BuildSummary, FAVICON_FILE, STATIC_DIR, THEME_FILE};
use crate::post::{Layout, Post};
use crate::process::{ImageMeta, ImageSet};
use crate::seo::ROBOTS_PATH;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// `1 post`, `3 posts`.
fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    }
}

/// Path shown on `Source:` lines: relative to the site root when possible.
fn display_source(path: &Path, source_root: &Path) -> String {
    path.strip_prefix(source_root)
        .unwrap_or(path)
        .display()
        .to_string()
}

// ============================================================================
// Scan
// ============================================================================

pub fn format_scan_output(posts: &[Post], source_root: &Path) -> Vec<String> {
    let mut lines = vec!["Posts".to_string()];

    if posts.is_empty() {
        lines.push("    (none)".to_string());
    }
    for (i, post) in posts.iter().enumerate() {
        lines.push(format!(
            "{} {} {} → {}",
            format_index(i + 1),
            post.iso_date(),
            post.title,
            post.url_path()
        ));
        lines.push(format!(
            "    Source: {}",
            display_source(&post.source_path, source_root)
        ));

        let mut details = Vec::new();
        if !post.images.is_empty() {
            details.push(plural(post.images.len(), "image"));
        }
        if post.layout == Layout::Photo {
            details.push("photo layout".to_string());
        }
        if !details.is_empty() {
            lines.push(format!("    {}", details.join(", ")));
        }
        if let Some(excerpt) = &post.excerpt {
            lines.push(format!("    Excerpt: {}", truncate_desc(excerpt.trim(), 60)));
        }
    }

    lines.push(String::new());
    lines.push("Site".to_string());
    for file in ["config.toml", THEME_FILE, FAVICON_FILE, ROBOTS_PATH] {
        if source_root.join(file).is_file() {
            lines.push(format!("    {file}"));
        }
    }
    if source_root.join(STATIC_DIR).is_dir() {
        lines.push(format!("    {STATIC_DIR}/"));
    }

    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(posts: &[Post], source_root: &Path) {
    for line in format_scan_output(posts, source_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Process
// ============================================================================

fn image_lines(index: usize, meta: &ImageMeta) -> Vec<String> {
    let size = match (meta.intrinsic_width, meta.intrinsic_height) {
        (Some(w), Some(h)) => format!("{w}x{h}"),
        _ => "(no size)".to_string(),
    };
    let mut lines = vec![format!("{} {} {}", format_index(index), meta.path, size)];
    if !meta.variants.is_empty() {
        let widths: Vec<String> = meta.variants.keys().map(|w| format!("{w}w")).collect();
        lines.push(format!("    Variants: {}", widths.join(", ")));
    }
    if meta.is_lcp_candidate {
        lines.push("    LCP candidate".to_string());
    }
    lines
}

pub fn format_process_output(images: &ImageSet) -> Vec<String> {
    let mut lines: Vec<String> = images
        .iter()
        .enumerate()
        .flat_map(|(i, meta)| image_lines(i + 1, meta))
        .collect();
    lines.push(format!("Images: {}", images.stats()));
    lines
}

pub fn print_process_output(images: &ImageSet) {
    for line in format_process_output(images) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_summary(summary: &BuildSummary) -> Vec<String> {
    let mut lines = summary.written.clone();
    if summary.copied > 0 {
        lines.push(format!("Copied {}", plural(summary.copied, "file")));
    }
    lines.push(format!(
        "Built {}, {}, {} ({}) → {}",
        plural(summary.posts, "post"),
        plural(summary.pages, "page"),
        plural(summary.images, "image"),
        plural(summary.variants, "variant"),
        summary.output.display()
    ));
    if let Some(leftover) = &summary.leftover {
        lines.push(format!(
            "Warning: previous output left at {} (remove it by hand)",
            leftover.display()
        ));
    }
    lines
}

pub fn print_build_summary(summary: &BuildSummary) {
    for line in format_build_summary(summary) {
        println!("{}", line);
    }
}

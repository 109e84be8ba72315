//! Shared test utilities.
//!
//! Sites are built programmatically inside a [`TempDir`] rather than copied
//! from a fixtures directory, so each test states exactly which posts and
//! images it depends on.
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_post(tmp.path(), "2024/10/2024-10-12-a.md", "+++\ntitle = \"A\"\n+++\nHi");
//! create_test_jpeg(&tmp.path().join("static/a.jpg"), 1600, 1200);
//! ```

use chrono::{Duration, NaiveDate};
use image::{ImageEncoder, RgbImage};
use std::path::{Path, PathBuf};

use crate::post::{ImageRef, Layout, Post};
use crate::scan::POSTS_DIR;

// =========================================================================
// Filesystem fixtures
// =========================================================================

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// Write a post source file at `<root>/posts/<relative>`.
pub fn write_post(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(POSTS_DIR).join(relative);
    write_file(&path, content.as_bytes());
    path
}

/// Write `<root>/config.toml`.
pub fn write_config(root: &Path, content: &str) {
    write_file(&root.join("config.toml"), content.as_bytes());
}

/// Gradient JPEG of the given size.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let writer = std::io::BufWriter::new(create(path));
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Gradient PNG of the given size.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let writer = std::io::BufWriter::new(create(path));
    image::codecs::png::PngEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

fn create(path: &Path) -> std::fs::File {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::File::create(path).unwrap()
}

// =========================================================================
// In-memory posts
// =========================================================================

/// A minimal post dated `date` with the given images.
pub fn make_post(slug: &str, date: NaiveDate, images: &[&str]) -> Post {
    Post {
        title: slug.replace('-', " "),
        date,
        slug: slug.to_string(),
        images: images
            .iter()
            .map(|src| ImageRef {
                src: src.to_string(),
                alt: None,
            })
            .collect(),
        excerpt: None,
        layout: Layout::Default,
        body_html: format!("<p>Body of {slug}.</p>\n"),
        body_text: format!("Body of {slug}."),
        source_path: PathBuf::from(format!("{POSTS_DIR}/{date}-{slug}.md")),
    }
}

/// `n` image-less posts with distinct dates, newest first.
pub fn dated_posts(n: usize) -> Vec<Post> {
    let newest = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    (0..n)
        .map(|i| make_post(&format!("post-{i:03}"), newest - Duration::days(i as i64), &[]))
        .collect()
}

// =========================================================================
// Extractors
// =========================================================================

/// Slugs in list order.
pub fn post_slugs(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|p| p.slug.as_str()).collect()
}

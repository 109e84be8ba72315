//! Post discovery.
//!
//! Stage 1 of the build. Walks `posts/` under the site root, parses every
//! Markdown file into a [`Post`], and returns them in publication order.
//!
//! ## Directory Structure
//!
//! ```text
//! site/                                # Site root
//! ├── config.toml                      # Site configuration (optional)
//! ├── posts/
//! │   └── 2024/
//! │       └── 10/
//! │           ├── 2024-10-12-a.md      # → /2024/10/a/
//! │           └── 2024-10-14-harbour.md
//! └── static/
//!     └── a.jpg
//! ```
//!
//! The `YYYY/MM/` nesting is a convention, not a requirement: any `.md` file
//! below `posts/` is a post. Hidden files and directories (`.name`) are
//! skipped so editor swap files and `.git` never leak into a build.
//!
//! ## Validation
//!
//! Scanning is all-or-nothing. The first unreadable file, malformed front
//! matter, or invalid post aborts the scan with an error naming the file.
//! Two posts resolving to the same `YYYY/MM/slug/` URL are also an error.

use crate::frontmatter::{self, FrontMatterError};
use crate::post::{Post, PostError, sort_posts};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed front matter in {}: {source}", path.display())]
    MalformedFrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },
    #[error("invalid post {}: {source}", path.display())]
    InvalidPost {
        path: PathBuf,
        #[source]
        source: PostError,
    },
    #[error("posts directory not found: {}", .0.display())]
    MissingPostsDir(PathBuf),
}

/// Directory under the site root holding post sources.
pub const POSTS_DIR: &str = "posts";

/// Discover, parse, and order every post under `<root>/posts`.
pub fn scan(root: &Path) -> Result<Vec<Post>, ScanError> {
    let posts_dir = root.join(POSTS_DIR);
    if !posts_dir.is_dir() {
        return Err(ScanError::MissingPostsDir(posts_dir));
    }

    let mut posts = collect_post_files(&posts_dir)?
        .iter()
        .map(|path| parse_post_file(path))
        .collect::<Result<Vec<_>, _>>()?;

    sort_posts(&mut posts);
    check_unique_urls(&posts)?;
    Ok(posts)
}

/// Parse a single post file.
pub fn parse_post_file(path: &Path) -> Result<Post, ScanError> {
    let content = fs::read_to_string(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = frontmatter::parse(&content).map_err(|source| ScanError::MalformedFrontMatter {
        path: path.to_path_buf(),
        source,
    })?;
    Post::from_document(&doc, path).map_err(|source| ScanError::InvalidPost {
        path: path.to_path_buf(),
        source,
    })
}

/// All `.md` files below `dir`, in path order.
fn collect_post_files(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            ScanError::Io {
                path,
                source: e.into(),
            }
        })?;
        if entry.file_type().is_file() && is_markdown(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

/// Fail on the first URL produced by more than one post.
fn check_unique_urls(posts: &[Post]) -> Result<(), ScanError> {
    let mut seen: HashMap<String, &Path> = HashMap::new();
    for post in posts {
        let url = post.url_path();
        if let Some(other) = seen.get(&url) {
            return Err(ScanError::InvalidPost {
                path: post.source_path.clone(),
                source: PostError::DuplicateUrl {
                    url,
                    other: other.to_path_buf(),
                },
            });
        }
        seen.insert(url, &post.source_path);
    }
    Ok(())
}

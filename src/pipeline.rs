//! Build orchestration.
//!
//! ```text
//! load_site       config.toml + posts/  →  Site            (nothing written)
//! stage_output    Site                  →  Staging         (.dist.staging/)
//! process_images  Site                  →  ImageSet        (variants into staging)
//! write_site      Site + ImageSet       →  BuildSummary    (pages, assets, publish)
//! ```
//!
//! Every post is parsed and validated by [`load_site`] before the staging
//! directory exists, and the staging tree only replaces the output once
//! [`write_site`] has written everything. Any error in between drops the
//! staging directory and leaves the previous output as it was.
//!
//! [`build`] runs all stages; [`check`] runs the first and identifies every
//! image without writing anything.

use crate::cache::MemoStats;
use crate::config::{self, ConfigError, SiteConfig};
use crate::feed::{ATOM_PATH, FeedSource, RSS_PATH, render_atom, render_rss};
use crate::generate::{
    BUILTIN_CSS, SiteContext, footer_year, render_feed_page, render_post_page,
};
use crate::imaging::{ImageBackend, RustBackend};
use crate::pagination::paginate;
use crate::post::Post;
use crate::process::{self, ImageSet, ProcessConfig, ProcessError};
use crate::scan::{self, ScanError};
use crate::seo::{ROBOTS_PATH, SITEMAP_PATH, render_robots, render_sitemap};
use crate::urls::SiteUrls;
use crate::write::{Staging, WriteError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory copied verbatim into the output.
pub const STATIC_DIR: &str = "static";
/// Optional stylesheet replacing the built-in one.
pub const THEME_FILE: &str = "theme.css";
pub const FAVICON_FILE: &str = "favicon.png";
/// The stylesheet is also published as a standalone file.
pub const STYLESHEET_PATH: &str = "style.css";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Where to read the site from and where to write it.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Explicit config file; defaults to `<source>/config.toml` if present.
    pub config: Option<PathBuf>,
}

/// A loaded and validated site.
#[derive(Debug)]
pub struct Site {
    pub root: PathBuf,
    pub config: SiteConfig,
    /// Newest first.
    pub posts: Vec<Post>,
}

/// What a build produced.
#[derive(Debug)]
pub struct BuildSummary {
    pub output: PathBuf,
    pub posts: usize,
    /// Feed pages (index plus `page/N/`).
    pub pages: usize,
    pub images: usize,
    pub variants: usize,
    pub image_stats: MemoStats,
    pub feeds: bool,
    /// Files written, relative to the output root, in write order. Static
    /// and image copies are counted in `copied` instead.
    pub written: Vec<String>,
    pub copied: usize,
    /// Previous output that was replaced but could not be removed.
    pub leftover: Option<PathBuf>,
}

/// Result of a `check`.
#[derive(Debug)]
pub struct CheckSummary {
    pub site: Site,
    pub images: ImageSet,
}

/// Build the site with the production image backend.
pub fn build(options: &BuildOptions) -> Result<BuildSummary, BuildError> {
    build_with_backend(&RustBackend::new(), options)
}

/// Build the site with a custom image backend.
pub fn build_with_backend(
    backend: &impl ImageBackend,
    options: &BuildOptions,
) -> Result<BuildSummary, BuildError> {
    let site = load_site(&options.source, options.config.as_deref())?;
    let staging = stage_output(&site, &options.output)?;
    let images = process_images(backend, &site, Some(staging.path()))?;
    write_site(&site, &images, staging)
}

/// Parse and resolve everything without writing.
pub fn check(options: &BuildOptions) -> Result<CheckSummary, BuildError> {
    check_with_backend(&RustBackend::new(), options)
}

pub fn check_with_backend(
    backend: &impl ImageBackend,
    options: &BuildOptions,
) -> Result<CheckSummary, BuildError> {
    let site = load_site(&options.source, options.config.as_deref())?;
    let images = process_images(backend, &site, None)?;
    Ok(CheckSummary { site, images })
}

// ============================================================================
// Stages
// ============================================================================

/// Load the configuration and parse every post.
pub fn load_site(source: &Path, config_path: Option<&Path>) -> Result<Site, BuildError> {
    let config = match config_path {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(source)?,
    };
    let posts = scan::scan(source)?;
    Ok(Site {
        root: source.to_path_buf(),
        config,
        posts,
    })
}

/// Create the staging directory for `output`.
pub fn stage_output(site: &Site, output: &Path) -> Result<Staging, BuildError> {
    Ok(Staging::create(output, &site.root)?)
}

/// Resolve every referenced image; variants are written under `output_root`
/// when given.
pub fn process_images(
    backend: &impl ImageBackend,
    site: &Site,
    output_root: Option<&Path>,
) -> Result<ImageSet, BuildError> {
    let config = ProcessConfig::from_site_config(&site.config);
    Ok(process::process_with_backend(
        backend,
        &site.posts,
        &site.root,
        output_root,
        &config,
    )?)
}

/// Render and write every page and asset, then publish the staging tree.
pub fn write_site(
    site: &Site,
    images: &ImageSet,
    staging: Staging,
) -> Result<BuildSummary, BuildError> {
    let root = &site.root;
    let config = &site.config;
    let urls = SiteUrls::from_config(config);
    let css = read_optional(&root.join(THEME_FILE))?.unwrap_or_else(|| BUILTIN_CSS.to_string());
    let favicon = root.join(FAVICON_FILE);

    let feed_source = FeedSource {
        config,
        urls: &urls,
        images,
        posts: &site.posts,
    };
    let ctx = SiteContext {
        config,
        urls: &urls,
        images,
        css: &css,
        footer_year: footer_year(config, &site.posts),
        has_favicon: favicon.is_file(),
        has_feed: feed_source.is_available(),
    };

    let mut written = Vec::new();
    let mut emit = |path: String, contents: String| -> Result<(), WriteError> {
        staging.write(&path, contents)?;
        written.push(path);
        Ok(())
    };

    let pages = paginate(&site.posts, config.posts_per_page);
    for page in &pages {
        emit(page.output_path(), render_feed_page(&ctx, page).into_string())?;
    }
    for post in &site.posts {
        emit(
            format!("{}index.html", post.url_path()),
            render_post_page(&ctx, post).into_string(),
        )?;
    }

    emit(STYLESHEET_PATH.into(), css.clone())?;
    emit(
        SITEMAP_PATH.into(),
        render_sitemap(&site.posts, pages.len(), images, &urls),
    )?;
    let existing_robots = read_optional(&root.join(ROBOTS_PATH))?;
    emit(
        ROBOTS_PATH.into(),
        render_robots(existing_robots.as_deref(), &urls),
    )?;
    if let Some(atom) = render_atom(&feed_source) {
        emit(ATOM_PATH.into(), atom)?;
    }
    if let Some(rss) = render_rss(&feed_source) {
        emit(RSS_PATH.into(), rss)?;
    }

    let mut copied = 0;
    let static_dir = root.join(STATIC_DIR);
    if static_dir.is_dir() {
        copied += staging.copy_dir(&static_dir, STATIC_DIR)?;
    }
    for meta in images.iter() {
        if !is_under_static(&meta.path) {
            staging.copy_file(&meta.source, &meta.path)?;
            copied += 1;
        }
    }
    if ctx.has_favicon {
        staging.copy_file(&favicon, FAVICON_FILE)?;
        copied += 1;
    }

    let published = staging.publish()?;
    Ok(BuildSummary {
        output: published.output,
        posts: site.posts.len(),
        pages: pages.len(),
        images: images.len(),
        variants: images.variant_count(),
        image_stats: images.stats(),
        feeds: ctx.has_feed,
        written,
        copied,
        leftover: published.leftover,
    })
}

fn is_under_static(path: &str) -> bool {
    path.strip_prefix(STATIC_DIR)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Read a text file that may not exist.
fn read_optional(path: &Path) -> Result<Option<String>, WriteError> {
    if !path.is_file() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|source| WriteError::ReadFailure {
            path: path.to_path_buf(),
            source,
        })
}

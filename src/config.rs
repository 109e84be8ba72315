//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives at
//! the site root next to `posts/` and `static/`; every key is optional and
//! falls back to the stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! title = "Microblog"
//! tagline = ""
//! description = ""
//! author = ""
//! site_url = "https://example.com"  # Optional, enables absolute URLs and feeds
//! base_url = "/blog"                # Optional path prefix (or absolute URL)
//! eager_images = 2                  # Images loaded eagerly at the top of a page
//! posts_per_page = 10               # Feed page size
//! feed_max_posts = 20               # Entries in feed.xml / rss.xml
//! footer_year = 2024                # Optional, default = newest post's year
//!
//! [images]
//! widths = [480, 720, 1080]         # Responsive variant widths
//! quality = 85                      # JPEG quality (1-100)
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! The loaded [`SiteConfig`] is read-only for the rest of the build and is
//! passed by reference into every stage.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site title, shown in the header and in every `<title>`.
    pub title: String,
    /// Short line under the title.
    pub tagline: String,
    /// Default meta description for feed pages.
    pub description: String,
    /// Author name for the footer and feeds.
    pub author: String,
    /// Absolute origin the site is published at, e.g. `https://example.com`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
    /// Path prefix the site is hosted under (`/blog`), or an absolute URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Number of images loaded eagerly at the top of each page.
    pub eager_images: usize,
    /// Posts per feed page.
    pub posts_per_page: usize,
    /// Maximum number of entries in the Atom/RSS feeds.
    pub feed_max_posts: usize,
    /// Year shown in the footer. Defaults to the newest post's year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer_year: Option<i32>,
    /// Responsive image generation settings.
    pub images: ImagesConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Microblog".to_string(),
            tagline: String::new(),
            description: String::new(),
            author: String::new(),
            site_url: None,
            base_url: None,
            eager_images: 2,
            posts_per_page: 10,
            feed_max_posts: 20,
            footer_year: None,
            images: ImagesConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.posts_per_page == 0 {
            return Err(ConfigError::Validation(
                "posts_per_page must be at least 1".into(),
            ));
        }
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.widths.contains(&0) {
            return Err(ConfigError::Validation(
                "images.widths values must be non-zero".into(),
            ));
        }
        if let Some(site_url) = self.site_url.as_deref().map(str::trim)
            && !site_url.is_empty()
            && !is_absolute_url(site_url)
        {
            return Err(ConfigError::Validation(format!(
                "site_url must start with http:// or https:// (got {site_url:?})"
            )));
        }
        Ok(())
    }
}

/// Responsive image generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Target widths for resized variants. Widths at or above the source
    /// width are skipped.
    pub widths: Vec<u32>,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            widths: vec![480, 720, 1080],
            quality: 85,
        }
    }
}

/// Whether a string is an absolute `http(s)` URL.
pub fn is_absolute_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `config.toml` from the site root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the defaults.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let overlay = load_raw_config(&root.join("config.toml"))?;
    resolve_config(stock_defaults_value(), overlay)
}

/// Load an explicitly named config file. Unlike [`load_config`], the file
/// must exist.
pub fn load_config_file(path: &Path) -> Result<SiteConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value(), Some(overlay))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Microblog Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Site title, shown in the header and in every page title.
title = "Microblog"

# Short line shown under the title.
tagline = ""

# Default meta description for feed pages.
description = ""

# Author name used in the footer and in feeds.
author = ""

# Absolute origin the site is published at. When set, canonical, Open Graph,
# sitemap and feed URLs are absolute, robots.txt gets a Sitemap: line, and
# feed.xml / rss.xml are generated.
# site_url = "https://example.com"

# Path prefix when the site is hosted under a sub-path (or an absolute URL).
# base_url = "/blog"

# Number of images at the top of each page that load eagerly.
eager_images = 2

# Posts per feed page. Page 1 is index.html, later pages live at page/N/.
posts_per_page = 10

# Maximum number of entries in feed.xml and rss.xml.
feed_max_posts = 20

# Year shown in the footer. Defaults to the newest post's year.
# footer_year = 2024

# ---------------------------------------------------------------------------
# Responsive images
# ---------------------------------------------------------------------------
[images]
# Variant widths to generate. Widths at or above the source width are skipped.
widths = [480, 720, 1080]

# JPEG encoding quality (1 = worst, 100 = best).
quality = 85
"##
}

//! Site URL resolution.
//!
//! Every link the generator emits goes through [`SiteUrls`] so the site can
//! be hosted under a sub-path:
//!
//! | `site_url` | `base_url` | `href("2024/10/a/")` | `public_url("2024/10/a/")` |
//! |---|---|---|---|
//! | – | – | `/2024/10/a/` | `/2024/10/a/` |
//! | – | `/blog` | `/blog/2024/10/a/` | `/blog/2024/10/a/` |
//! | `https://ex.com` | – | `/2024/10/a/` | `https://ex.com/2024/10/a/` |
//! | `https://ex.com` | `/blog` | `/blog/2024/10/a/` | `https://ex.com/blog/2024/10/a/` |
//! | – | `https://ex.com/blog` | `/blog/2024/10/a/` | `https://ex.com/blog/2024/10/a/` |
//!
//! An absolute `base_url` takes precedence over `site_url`.
//!
//! Site paths are percent-encoded segment by segment (`/` is kept), so a
//! file such as `static/my photo.jpg` yields `/static/my%20photo.jpg`, a
//! single token inside `srcset` and a valid sitemap `<loc>`.

use crate::config::{SiteConfig, is_absolute_url};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Bytes escaped inside one path segment. Non-ASCII is always escaped.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b',')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Percent-encode a relative site path, keeping its `/` separators.
pub fn encode_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolved URL prefix and public origin of a site.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SiteUrls {
    /// Path prefix without a trailing slash: `""` or `/blog`.
    prefix: String,
    /// Absolute base without a trailing slash, e.g. `https://ex.com/blog`.
    public_base: Option<String>,
}

impl SiteUrls {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(config.site_url.as_deref(), config.base_url.as_deref())
    }

    pub fn new(site_url: Option<&str>, base_url: Option<&str>) -> Self {
        let site_url = site_url.map(str::trim).filter(|s| !s.is_empty());
        let base_url = base_url.map(str::trim).filter(|s| !s.is_empty());

        if let Some(base) = base_url.filter(|b| is_absolute_url(b)) {
            let (origin, path) = split_origin(base);
            let prefix = normalize_prefix(path);
            return Self {
                public_base: Some(format!("{origin}{prefix}")),
                prefix,
            };
        }

        let prefix = normalize_prefix(base_url.unwrap_or(""));
        let public_base = site_url
            .filter(|s| is_absolute_url(s))
            .map(|s| format!("{}{prefix}", s.trim_end_matches('/')));
        Self {
            prefix,
            public_base,
        }
    }

    /// Path prefix, `""` when hosted at the root.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether absolute URLs can be produced.
    pub fn has_public_base(&self) -> bool {
        self.public_base.is_some()
    }

    /// Root-relative link to a site path (`""` is the home page).
    pub fn href(&self, path: &str) -> String {
        format!("{}/{}", self.prefix, encode_path(path))
    }

    /// Absolute URL to a site path, if a public base is known.
    pub fn absolute_url(&self, path: &str) -> Option<String> {
        self.public_base
            .as_ref()
            .map(|base| format!("{base}/{}", encode_path(path)))
    }

    /// Absolute URL when possible, otherwise root-relative.
    pub fn public_url(&self, path: &str) -> String {
        self.absolute_url(path).unwrap_or_else(|| self.href(path))
    }
}

/// Split `https://host:port/path` into (`https://host:port`, `/path`).
///
/// Callers guarantee `url` starts with `http://` or `https://`.
fn split_origin(url: &str) -> (&str, &str) {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    match url[scheme_end..].find('/') {
        Some(i) => url.split_at(scheme_end + i),
        None => (url, ""),
    }
}

/// `blog/`, `/blog`, `/blog/` → `/blog`; `/` or `` → ``.
fn normalize_prefix(path: &str) -> String {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or("")
        .trim_matches('/');
    if path.is_empty() {
        String::new()
    } else {
        format!("/{path}")
    }
}

//! Post model: turns a parsed front-matter [`Document`] into a [`Post`].
//!
//! ## Field resolution
//!
//! | Field | Source | Fallback |
//! |---|---|---|
//! | `date` | front matter `date` (TOML date or `"YYYY-MM-DD"` string) | filename date prefix |
//! | `slug` | front matter `slug` | filename slug |
//! | `title` | front matter `title` | slug with dashes as spaces |
//! | `images` | list of strings or `{ src, alt }` tables | empty |
//! | `excerpt` | front matter `excerpt` | none |
//! | `layout` | `"default"` or `"photo"` | `default` |
//!
//! A front-matter value that is present but malformed is an error; it never
//! silently falls back to the filename.
//!
//! ## Markdown
//!
//! Bodies are converted with pulldown-cmark (tables, footnotes, strikethrough).
//! Raw HTML blocks and inline HTML in the source are emitted as escaped text,
//! so a post body can never inject markup into the surrounding page.

use crate::frontmatter::Document;
use crate::naming::parse_post_filename;
use chrono::{Datelike, NaiveDate};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostError {
    #[error("no date in front matter or filename")]
    MissingDate,
    #[error("invalid `{field}`: {value} is not a YYYY-MM-DD date")]
    InvalidDate { field: String, value: String },
    #[error("slug is empty")]
    EmptySlug,
    #[error("invalid `{field}`: expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
    #[error("invalid images[{index}]: {reason}")]
    InvalidImage { index: usize, reason: String },
    #[error("URL /{url} is also produced by {}", other.display())]
    DuplicateUrl { url: String, other: PathBuf },
}

/// Maximum length of a description inferred from body text.
pub const DESCRIPTION_MAX_CHARS: usize = 160;

/// Reference to an image from a post's `images` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRef {
    /// Path relative to the site root, e.g. `static/a.jpg`.
    pub src: String,
    /// Alt text. `None` for plain-string entries.
    pub alt: Option<String>,
}

/// How a post page arranges its images relative to the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Body first, images after.
    #[default]
    Default,
    /// Images first, body after.
    Photo,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Default => "default",
            Layout::Photo => "photo",
        }
    }
}

/// A single post, immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub title: String,
    pub date: NaiveDate,
    pub slug: String,
    pub images: Vec<ImageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub layout: Layout,
    pub body_html: String,
    pub source_path: PathBuf,
    /// Body rendered to plain text, whitespace collapsed.
    #[serde(skip)]
    pub body_text: String,
}

impl Post {
    /// Build a post from a parsed document and the file it came from.
    pub fn from_document(doc: &Document, source_path: &Path) -> Result<Self, PostError> {
        let stem = source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parsed = parse_post_filename(&stem);
        let meta = &doc.metadata;

        let date = match meta.get("date") {
            Some(value) => parse_date(value)?,
            None => parsed.date.ok_or(PostError::MissingDate)?,
        };

        let raw_slug = match meta.get("slug") {
            Some(value) => value
                .as_str()
                .ok_or(PostError::InvalidField {
                    field: "slug",
                    expected: "a string",
                })?
                .to_string(),
            None => parsed.slug.clone(),
        };
        let slug = slug::slugify(&raw_slug);
        if slug.is_empty() {
            return Err(PostError::EmptySlug);
        }

        let title = match optional_string(meta, "title")? {
            Some(title) if !title.trim().is_empty() => title.trim().to_string(),
            _ if meta.contains_key("slug") => raw_slug.replace('-', " "),
            _ => parsed.display_title,
        };

        let excerpt = optional_string(meta, "excerpt")?
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        let layout = match optional_string(meta, "layout")?.as_deref() {
            None | Some("default") => Layout::Default,
            Some("photo") => Layout::Photo,
            Some(_) => {
                return Err(PostError::InvalidField {
                    field: "layout",
                    expected: "\"default\" or \"photo\"",
                });
            }
        };

        let images = match meta.get("images") {
            Some(value) => parse_images(value)?,
            None => Vec::new(),
        };

        Ok(Post {
            title,
            date,
            slug,
            images,
            excerpt,
            layout,
            body_html: render_markdown(&doc.body),
            body_text: plain_text(&doc.body),
            source_path: source_path.to_path_buf(),
        })
    }

    /// Output path relative to the site root: `YYYY/MM/slug/`.
    pub fn url_path(&self) -> String {
        format!(
            "{:04}/{:02}/{}/",
            self.date.year(),
            self.date.month(),
            self.slug
        )
    }

    /// Human-readable date, e.g. `12 Oct 2024`.
    pub fn display_date(&self) -> String {
        self.date.format("%d %b %Y").to_string()
    }

    /// Machine-readable date for `<time datetime>`.
    pub fn iso_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Meta description: excerpt, then title, then the start of the body
    /// text, then the site-wide description.
    pub fn description(&self, site_description: &str) -> String {
        if let Some(excerpt) = &self.excerpt {
            return collapse_whitespace(excerpt);
        }
        if !self.title.trim().is_empty() {
            return collapse_whitespace(&self.title);
        }
        if !self.body_text.is_empty() {
            let cut: String = self.body_text.chars().take(DESCRIPTION_MAX_CHARS).collect();
            return cut.trim_end().to_string();
        }
        collapse_whitespace(site_description)
    }
}

/// Newest first; same-day posts ordered by source path.
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.source_path.cmp(&b.source_path))
    });
}

fn optional_string(meta: &toml::Table, field: &'static str) -> Result<Option<String>, PostError> {
    match meta.get(field) {
        None => Ok(None),
        Some(toml::Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(PostError::InvalidField {
            field,
            expected: "a string",
        }),
    }
}

fn parse_date(value: &toml::Value) -> Result<NaiveDate, PostError> {
    let invalid = || PostError::InvalidDate {
        field: "date".into(),
        value: value.to_string(),
    };
    match value {
        toml::Value::Datetime(dt) => {
            let date = dt.date.ok_or_else(invalid)?;
            NaiveDate::from_ymd_opt(date.year.into(), date.month.into(), date.day.into())
                .ok_or_else(invalid)
        }
        toml::Value::String(s) => {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

fn parse_images(value: &toml::Value) -> Result<Vec<ImageRef>, PostError> {
    let entries = value.as_array().ok_or(PostError::InvalidField {
        field: "images",
        expected: "a list of paths or { src, alt } tables",
    })?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let invalid = |reason: &str| PostError::InvalidImage {
                index,
                reason: reason.to_string(),
            };
            let (src, alt) = match entry {
                toml::Value::String(src) => (src.as_str(), None),
                toml::Value::Table(table) => {
                    let src = table
                        .get("src")
                        .or_else(|| table.get("path"))
                        .and_then(toml::Value::as_str)
                        .ok_or_else(|| invalid("missing `src`"))?;
                    let alt = match table.get("alt") {
                        None => None,
                        Some(toml::Value::String(alt)) => Some(alt.clone()),
                        Some(_) => return Err(invalid("`alt` must be a string")),
                    };
                    (src, alt)
                }
                _ => return Err(invalid("expected a path or a { src, alt } table")),
            };
            let src = src.trim();
            if src.is_empty() {
                return Err(invalid("empty `src`"));
            }
            let path = Path::new(src);
            if path.is_absolute() || src.starts_with('/') || src.contains("://") {
                return Err(invalid("`src` must be relative to the site root"));
            }
            if path.components().any(|c| c == Component::ParentDir) {
                return Err(invalid("`src` must not contain `..`"));
            }
            Ok(ImageRef {
                src: src.trim_start_matches("./").to_string(),
                alt,
            })
        })
        .collect()
}

/// Render a Markdown body to HTML with raw HTML escaped.
pub fn render_markdown(body: &str) -> String {
    if body.trim().is_empty() {
        return String::new();
    }
    let parser = Parser::new_ext(body, markdown_options()).map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
        other => other,
    });
    let mut out = String::with_capacity(body.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut out, parser);
    out
}

/// Text content of a Markdown body with whitespace collapsed.
pub fn plain_text(body: &str) -> String {
    let mut text = String::new();
    for event in Parser::new_ext(body, markdown_options()) {
        match event {
            Event::Text(t) | Event::Code(t) | Event::Html(t) | Event::InlineHtml(t) => {
                text.push_str(&t)
            }
            Event::SoftBreak | Event::HardBreak | Event::Rule => text.push(' '),
            Event::Start(Tag::Paragraph | Tag::Item | Tag::Heading { .. })
            | Event::End(TagEnd::Paragraph | TagEnd::Item | TagEnd::Heading(_)) => {
                text.push(' ')
            }
            _ => {}
        }
    }
    collapse_whitespace(&text)
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_FOOTNOTES | Options::ENABLE_STRIKETHROUGH
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

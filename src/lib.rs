//! # Microblog
//!
//! A static site generator for a dated Markdown microblog. Posts are plain
//! files with TOML front matter; the output is pre-rendered HTML with
//! responsive images, a sitemap, robots.txt and Atom/RSS feeds.
//!
//! # Architecture: One-Way Pipeline
//!
//! ```text
//! 1. Load      config.toml + posts/  →  Site      (parse, validate, sort)
//! 2. Process   Site                  →  ImageSet  (dimensions, variants, LCP)
//! 3. Write     Site + ImageSet       →  dist/     (pages, assets, SEO files)
//! ```
//!
//! Data flows one way; no stage feeds back into an earlier one. Every post
//! is validated before anything is written, and the output directory is only
//! replaced once the whole site has been written to a staging directory, so
//! a failed build never leaves a half-published site behind.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`frontmatter`] | Splits a source file into its `+++` TOML block and Markdown body |
//! | [`naming`] | `YYYY-MM-DD-slug` filename convention parser |
//! | [`post`] | Post model: field resolution, image refs, Markdown rendering |
//! | [`scan`] | Stage 1: walks `posts/`, parses, sorts, detects URL clashes |
//! | [`imaging`] | Pixel work behind the [`imaging::ImageBackend`] trait |
//! | [`cache`] | Per-build image memo keyed by canonical path |
//! | [`process`] | Stage 2: image metadata, variants, eager/lazy loading plan |
//! | [`urls`] | Base-path and public URL resolution |
//! | [`pagination`] | Splits the ordered posts into feed pages |
//! | [`generate`] | HTML rendering with Maud |
//! | [`seo`] | `sitemap.xml` and `robots.txt` |
//! | [`feed`] | Atom and RSS feeds |
//! | [`write`] | Staging directory and atomic publication |
//! | [`pipeline`] | Stage orchestration and [`pipeline::BuildError`] |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time
//! HTML macro system. Malformed markup is a build error, interpolation is
//! escaped by default, and there is no template directory to ship.
//!
//! ## Deterministic Output
//!
//! Posts are ordered by date then source path, images by first reference,
//! and no timestamp comes from the clock: the footer year is configured or
//! taken from the newest post, feed dates come from post dates. Building
//! twice from the same input produces byte-identical output.
//!
//! ## Explicit Memo, Not a Cache
//!
//! Image metadata is memoized per build in [`cache::ImageMemo`], keyed by
//! the canonicalized source path. Nothing persists between builds, so a
//! stale entry can never be reused for a different file.

pub mod cache;
pub mod config;
pub mod feed;
pub mod frontmatter;
pub mod generate;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod pagination;
pub mod pipeline;
pub mod post;
pub mod process;
pub mod scan;
pub mod seo;
pub mod urls;
pub mod write;

#[cfg(test)]
pub(crate) mod test_helpers;

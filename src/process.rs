//! Image metadata resolution and responsive variant generation.
//!
//! Stage 2 of the build. Takes the posts from the scan stage and resolves
//! every referenced image exactly once:
//!
//! 1. Resolve `src` against the site root and canonicalize it (the memo key).
//! 2. Read intrinsic dimensions (raster header, AVIF container, SVG markup).
//! 3. For JPEG/PNG/WebP, write resized variants next to where the original
//!    lands in the output tree, skipping widths at or above the source width.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! └── static/
//!     ├── a.jpg            # original, copied by the writer
//!     ├── a-480w.jpg       # variants, written here
//!     ├── a-720w.jpg
//!     └── a-1080w.jpg
//! ```
//!
//! ## Loading plan
//!
//! [`plan_loading`] decides per page which images load eagerly and which one
//! gets `fetchpriority="high"` plus a preload hint: the first `eager_images`
//! images are eager, and the first portrait-or-square one among them (else
//! simply the first) is the priority image.

use crate::cache::{ImageMemo, MemoStats, canonical_key};
use crate::config::SiteConfig;
use crate::imaging::{
    BackendError, Dimensions, ImageBackend, PRIMARY_TARGET_WIDTH, Quality, ResponsiveConfig,
    RustBackend, SourceFormat, choose_primary, create_responsive_images, get_dimensions,
    is_lcp_candidate, svg_dimensions,
};
use crate::post::Post;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("missing image {src:?} in {}: {} does not exist", post.display(), resolved.display())]
    MissingAsset {
        post: PathBuf,
        src: String,
        resolved: PathBuf,
    },
    #[error("unsupported image {}: {reason}", path.display())]
    UnsupportedImageFormat { path: PathBuf, reason: String },
    #[error("image {src:?} in {} resolves outside the site root", post.display())]
    AssetOutsideRoot { post: PathBuf, src: String },
    #[error(
        "variant {variant} of {} would overwrite the site file {}",
        image.display(),
        existing.display()
    )]
    VariantClash {
        image: PathBuf,
        variant: String,
        existing: PathBuf,
    },
    #[error("cannot resolve site root {}: {source}", path.display())]
    SiteRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {}: {source}", path.display())]
    OutputWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `sizes` attribute paired with every `srcset`.
pub const SIZES_HINT: &str = "(max-width: 760px) 100vw, 720px";

/// Configuration for image processing
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub widths: Vec<u32>,
    pub quality: u32,
}

impl ProcessConfig {
    /// Build a ProcessConfig from SiteConfig values.
    pub fn from_site_config(config: &SiteConfig) -> Self {
        Self {
            widths: config.images.widths.clone(),
            quality: config.images.quality,
        }
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self::from_site_config(&SiteConfig::default())
    }
}

/// Resolved metadata for one distinct source image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageMeta {
    /// Path of the original relative to the site (and output) root, with
    /// forward slashes, e.g. `static/a.jpg`.
    pub path: String,
    /// Canonical source path on disk.
    #[serde(skip)]
    pub source: PathBuf,
    /// `None` only for SVGs that declare no size.
    pub intrinsic_width: Option<u32>,
    pub intrinsic_height: Option<u32>,
    /// Generated variants: width → output-relative path.
    pub variants: BTreeMap<u32, String>,
    pub is_lcp_candidate: bool,
}

impl ImageMeta {
    /// Every `srcset` candidate: variants plus the original at its intrinsic
    /// width, narrowest first. Empty when the width is unknown.
    pub fn srcset_candidates(&self) -> Vec<(&str, u32)> {
        let Some(width) = self.intrinsic_width else {
            return Vec::new();
        };
        let mut candidates: Vec<(&str, u32)> = self
            .variants
            .iter()
            .map(|(w, path)| (path.as_str(), *w))
            .collect();
        candidates.push((self.path.as_str(), width));
        candidates
    }

    /// The `src` to use: smallest candidate at least
    /// [`PRIMARY_TARGET_WIDTH`] wide, else the widest, else the original.
    pub fn primary_path(&self) -> &str {
        let candidates = self.srcset_candidates();
        let widths: Vec<u32> = candidates.iter().map(|(_, w)| *w).collect();
        match choose_primary(&widths, PRIMARY_TARGET_WIDTH) {
            Some(i) => candidates[i].0,
            None => &self.path,
        }
    }
}

/// All resolved images of a build, looked up by the `src` written in posts.
#[derive(Debug, Default)]
pub struct ImageSet {
    by_src: HashMap<String, PathBuf>,
    metas: HashMap<PathBuf, ImageMeta>,
    /// Canonical paths in first-reference order.
    order: Vec<PathBuf>,
    stats: MemoStats,
}

impl ImageSet {
    /// Metadata for an image `src` as written in a post.
    pub fn get(&self, src: &str) -> Option<&ImageMeta> {
        self.by_src.get(src).and_then(|key| self.metas.get(key))
    }

    /// Distinct images in the order they were first referenced.
    pub fn iter(&self) -> impl Iterator<Item = &ImageMeta> {
        self.order.iter().filter_map(|key| self.metas.get(key))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn variant_count(&self) -> usize {
        self.iter().map(|m| m.variants.len()).sum()
    }

    /// How many references were answered from the memo.
    pub fn stats(&self) -> MemoStats {
        self.stats
    }
}

#[cfg(test)]
impl ImageSet {
    /// Build a set directly from metadata; each image is referenced by its
    /// `path`.
    pub(crate) fn from_metas(metas: Vec<ImageMeta>) -> Self {
        let mut set = Self::default();
        for meta in metas {
            let key = PathBuf::from(&meta.path);
            set.by_src.insert(meta.path.clone(), key.clone());
            set.order.push(key.clone());
            set.metas.insert(key, meta);
        }
        set
    }
}

/// Process every image referenced by `posts` with the production backend.
///
/// `output_root` is the directory the site is being written to; `None`
/// identifies images without writing anything.
pub fn process(
    posts: &[Post],
    root: &Path,
    output_root: Option<&Path>,
    config: &ProcessConfig,
) -> Result<ImageSet, ProcessError> {
    process_with_backend(&RustBackend::new(), posts, root, output_root, config)
}

/// Process every image referenced by `posts` with a custom backend.
pub fn process_with_backend(
    backend: &impl ImageBackend,
    posts: &[Post],
    root: &Path,
    output_root: Option<&Path>,
    config: &ProcessConfig,
) -> Result<ImageSet, ProcessError> {
    let canonical_root = canonical_key(root).map_err(|source| ProcessError::SiteRoot {
        path: root.to_path_buf(),
        source,
    })?;
    let responsive = ResponsiveConfig {
        widths: config.widths.clone(),
        quality: Quality::new(config.quality),
    };

    let mut memo: ImageMemo<ImageMeta> = ImageMemo::new();
    let mut set = ImageSet::default();

    for post in posts {
        for image in &post.images {
            let resolved = root.join(&image.src);
            let key = match canonical_key(&resolved) {
                Ok(key) if key.is_file() => key,
                _ => {
                    return Err(ProcessError::MissingAsset {
                        post: post.source_path.clone(),
                        src: image.src.clone(),
                        resolved,
                    });
                }
            };
            let relative = key
                .strip_prefix(&canonical_root)
                .map_err(|_| ProcessError::AssetOutsideRoot {
                    post: post.source_path.clone(),
                    src: image.src.clone(),
                })?
                .to_path_buf();

            let is_new = memo.get(&key).is_none();
            let meta = memo.get_or_try_insert_with(key.clone(), |source| {
                let output = output_root.map(|out| out.join(&relative));
                resolve_image(backend, source, &relative, output.as_deref(), &responsive)
            })?;
            if is_new {
                check_variant_clash(meta, &canonical_root)?;
                set.order.push(key.clone());
            }
            set.by_src.insert(image.src.clone(), key);
        }
    }

    set.stats = *memo.stats();
    set.metas = memo.into_entries();
    Ok(set)
}

/// Generated variants share the output tree with copied site files, so a
/// variant name that already exists in the site is an error.
fn check_variant_clash(meta: &ImageMeta, root: &Path) -> Result<(), ProcessError> {
    for variant in meta.variants.values() {
        let existing = root.join(variant);
        if existing.exists() {
            return Err(ProcessError::VariantClash {
                image: meta.source.clone(),
                variant: variant.clone(),
                existing,
            });
        }
    }
    Ok(())
}

/// Identify one source image and generate its variants.
fn resolve_image(
    backend: &impl ImageBackend,
    source: &Path,
    relative: &Path,
    output: Option<&Path>,
    config: &ResponsiveConfig,
) -> Result<ImageMeta, ProcessError> {
    let unsupported = |reason: String| ProcessError::UnsupportedImageFormat {
        path: source.to_path_buf(),
        reason,
    };

    let format = SourceFormat::from_path(source)
        .ok_or_else(|| unsupported("not a JPEG, PNG, WebP, AVIF, or SVG file".into()))?;

    let dims = match format {
        SourceFormat::Svg => svg_dimensions(source).map_err(|e| unsupported(e.to_string()))?,
        SourceFormat::Raster | SourceFormat::Avif => {
            let (width, height) =
                get_dimensions(backend, source).map_err(|e| unsupported(e.to_string()))?;
            Some(Dimensions { width, height })
        }
    };

    let path = to_url_path(relative);
    let mut variants = BTreeMap::new();
    if format.has_variants()
        && let Some(dims) = dims
    {
        if let Some(output) = output
            && let Some(dir) = output.parent()
        {
            std::fs::create_dir_all(dir).map_err(|source| ProcessError::OutputWriteFailure {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let generated =
            create_responsive_images(backend, source, output, (dims.width, dims.height), config)
                .map_err(|e| match e {
                    BackendError::Io(io) => ProcessError::OutputWriteFailure {
                        path: output.unwrap_or(source).to_path_buf(),
                        source: io,
                    },
                    BackendError::ProcessingFailed(reason) => unsupported(reason),
                })?;
        let dir = match path.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/"),
            None => String::new(),
        };
        for variant in generated {
            variants.insert(variant.width, format!("{dir}{}", variant.file_name));
        }
    }

    Ok(ImageMeta {
        path,
        source: source.to_path_buf(),
        intrinsic_width: dims.map(|d| d.width),
        intrinsic_height: dims.map(|d| d.height),
        variants,
        is_lcp_candidate: dims.is_some_and(|d| is_lcp_candidate(d.width, d.height)),
    })
}

fn to_url_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// Loading plan
// ============================================================================

/// How a single `<img>` loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loading {
    Eager { high_priority: bool },
    Lazy,
}

impl Loading {
    pub fn attr(self) -> &'static str {
        match self {
            Loading::Eager { .. } => "eager",
            Loading::Lazy => "lazy",
        }
    }

    pub fn is_high_priority(self) -> bool {
        matches!(self, Loading::Eager { high_priority: true })
    }
}

/// Loading plan for a page's images given in render order.
///
/// `lcp_candidates[i]` says whether image `i` is portrait or square.
pub fn plan_loading(lcp_candidates: &[bool], eager: usize) -> Vec<Loading> {
    let eager = eager.min(lcp_candidates.len());
    let priority = lcp_candidates[..eager]
        .iter()
        .position(|&lcp| lcp)
        .or((eager > 0).then_some(0));

    (0..lcp_candidates.len())
        .map(|i| {
            if i < eager {
                Loading::Eager {
                    high_priority: Some(i) == priority,
                }
            } else {
                Loading::Lazy
            }
        })
        .collect()
}

//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{VariantSize, calculate_variant_sizes};
use super::params::{Quality, ResizeParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Generated image variant: file name (next to the original) and size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVariant {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

/// Configuration for responsive image generation.
#[derive(Debug, Clone)]
pub struct ResponsiveConfig {
    pub widths: Vec<u32>,
    pub quality: Quality,
}

/// `photo.jpg` at 480 px → `photo-480w.jpg`. The extension keeps its case.
pub fn variant_file_name(source_name: &str, width: u32) -> String {
    match source_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{width}w.{ext}"),
        _ => format!("{source_name}-{width}w"),
    }
}

/// Create responsive variants of `source` next to `output`.
///
/// `output` is where the original lands in the output tree; variants are
/// written into the same directory. With `output = None` the variants are
/// only planned and the backend is never asked to resize (check mode).
pub fn create_responsive_images(
    backend: &impl ImageBackend,
    source: &Path,
    output: Option<&Path>,
    original_dims: (u32, u32),
    config: &ResponsiveConfig,
) -> Result<Vec<GeneratedVariant>> {
    let source_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut variants = Vec::new();
    for VariantSize { width, height } in calculate_variant_sizes(original_dims, &config.widths) {
        let file_name = variant_file_name(&source_name, width);

        if let Some(output) = output {
            let output_dir = output.parent().unwrap_or(Path::new(""));
            backend.resize(&ResizeParams {
                source: source.to_path_buf(),
                output: output_dir.join(&file_name),
                width,
                height,
                quality: config.quality,
            })?;
        }

        variants.push(GeneratedVariant {
            file_name,
            width,
            height,
        });
    }

    Ok(variants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    fn config(widths: &[u32]) -> ResponsiveConfig {
        ResponsiveConfig {
            widths: widths.to_vec(),
            quality: Quality::new(85),
        }
    }

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1920,
            height: 1080,
        }]);

        let dims = get_dimensions(&backend, Path::new("/test.jpg")).unwrap();
        assert_eq!(dims, (1920, 1080));
    }

    #[test]
    fn variant_names() {
        assert_eq!(variant_file_name("a.jpg", 480), "a-480w.jpg");
        assert_eq!(variant_file_name("My.Photo.PNG", 720), "My.Photo-720w.PNG");
        assert_eq!(variant_file_name("noext", 480), "noext-480w");
        assert_eq!(variant_file_name(".hidden", 480), ".hidden-480w");
    }

    #[test]
    fn create_responsive_skips_larger_sizes() {
        let backend = MockBackend::new();

        // Original is 1000px - should skip 1080
        let variants = create_responsive_images(
            &backend,
            Path::new("/site/static/a.jpg"),
            Some(Path::new("/out/static/a.jpg")),
            (1000, 750),
            &config(&[480, 720, 1080]),
        )
        .unwrap();

        let widths: Vec<u32> = variants.iter().map(|v| v.width).collect();
        assert_eq!(widths, vec![480, 720]);
        assert_eq!(backend.get_operations().len(), 2);
    }

    #[test]
    fn create_responsive_writes_next_to_output() {
        let backend = MockBackend::new();

        create_responsive_images(
            &backend,
            Path::new("/site/static/a.jpg"),
            Some(Path::new("/out/static/a.jpg")),
            (2000, 1500),
            &config(&[480]),
        )
        .unwrap();

        let ops = backend.get_operations();
        assert_eq!(
            ops,
            vec![RecordedOp::Resize {
                source: "/site/static/a.jpg".into(),
                output: "/out/static/a-480w.jpg".into(),
                width: 480,
                height: 360,
                quality: 85,
            }]
        );
    }

    #[test]
    fn create_responsive_plan_only_without_output() {
        let backend = MockBackend::new();

        let variants = create_responsive_images(
            &backend,
            Path::new("/site/static/a.jpg"),
            None,
            (2000, 1500),
            &config(&[480, 720]),
        )
        .unwrap();

        assert_eq!(variants.len(), 2);
        assert_eq!(variants[1].file_name, "a-720w.jpg");
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn create_responsive_small_original_has_no_variants() {
        let backend = MockBackend::new();

        let variants = create_responsive_images(
            &backend,
            Path::new("/source.jpg"),
            Some(Path::new("/out/source.jpg")),
            (300, 200),
            &config(&[480, 720, 1080]),
        )
        .unwrap();

        assert!(variants.is_empty());
        assert!(backend.get_operations().is_empty());
    }
}

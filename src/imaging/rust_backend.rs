//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify (JPEG, PNG, WebP) | `image::image_dimensions` (header only) |
//! | Identify (AVIF) | `avif-parse` container metadata |
//! | Decode | `image::ImageReader` |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the configured quality |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ResizeParams;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Extract dimensions from an AVIF file's container metadata (no decode needed).
fn identify_avif(path: &Path) -> Result<Dimensions, BackendError> {
    let file_data = std::fs::read(path).map_err(BackendError::Io)?;
    let avif = avif_parse::read_avif(&mut std::io::Cursor::new(&file_data)).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to parse AVIF {}: {e:?}", path.display()))
    })?;
    let meta = avif.primary_item_metadata().map_err(|e| {
        BackendError::ProcessingFailed(format!(
            "Failed to read AVIF metadata {}: {e:?}",
            path.display()
        ))
    })?;
    Ok(Dimensions {
        width: meta.max_frame_width.get(),
        height: meta.max_frame_height.get(),
    })
}

/// Save a DynamicImage to the given path, inferring format from extension.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let writer = BufWriter::new(File::create(path).map_err(BackendError::Io)?);
    let encode_failed =
        |e: image::ImageError| BackendError::ProcessingFailed(format!("{}: {e}", path.display()));

    match extension(path).as_str() {
        "jpg" | "jpeg" => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100) as u8);
            rgb.write_with_encoder(encoder).map_err(encode_failed)
        }
        "png" => img
            .write_with_encoder(PngEncoder::new(writer))
            .map_err(encode_failed),
        "webp" => {
            let encoder = WebPEncoder::new_lossless(writer);
            let pixels = if img.color().has_alpha() {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            };
            pixels.write_with_encoder(encoder).map_err(encode_failed)
        }
        other => Err(BackendError::ProcessingFailed(format!(
            "Unsupported output format: {}",
            other
        ))),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        if extension(path) == "avif" {
            return identify_avif(path);
        }
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        save_image(&resized, &params.output, params.quality.value())
    }
}

//! Image processing in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** (JPEG, PNG, WebP) | `image::image_dimensions` |
//! | **Identify** (AVIF) | `avif-parse` container metadata |
//! | **Identify** (SVG) | root element `width`/`height`/`viewBox` |
//! | **Resize** | Lanczos3, re-encoded in the source format |
//!
//! The module is split into:
//! - **Format**: Classify a path by extension into raster, AVIF, or SVG
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
mod format;
pub mod operations;
mod params;
pub mod rust_backend;
mod svg;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    PRIMARY_TARGET_WIDTH, VariantSize, calculate_variant_sizes, choose_primary, is_lcp_candidate,
};
pub use format::SourceFormat;
pub use operations::{GeneratedVariant, ResponsiveConfig, create_responsive_images, get_dimensions};
pub use params::{Quality, ResizeParams};
pub use rust_backend::RustBackend;
pub use svg::svg_dimensions;

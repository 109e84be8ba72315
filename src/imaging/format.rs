//! Source format classification by file extension.

use std::path::Path;

/// How an image source is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// JPEG, PNG, or WebP: identified, and resized into variants.
    Raster,
    /// AVIF: identified from container metadata only, never resized.
    Avif,
    /// SVG: dimensions sniffed from markup when declared, never resized.
    Svg,
}

impl SourceFormat {
    /// Classify a path by its (case-insensitive) extension.
    ///
    /// Returns `None` for anything that is not a supported image.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "webp" => Some(Self::Raster),
            "avif" => Some(Self::Avif),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    /// Whether responsive variants are generated for this format.
    pub fn has_variants(self) -> bool {
        matches!(self, Self::Raster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_extensions() {
        for name in ["a.jpg", "a.JPEG", "a.png", "a.webp"] {
            assert_eq!(
                SourceFormat::from_path(Path::new(name)),
                Some(SourceFormat::Raster),
                "{name}"
            );
        }
    }

    #[test]
    fn identify_only_formats() {
        assert_eq!(
            SourceFormat::from_path(Path::new("x.avif")),
            Some(SourceFormat::Avif)
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("logo.SVG")),
            Some(SourceFormat::Svg)
        );
        assert!(!SourceFormat::Avif.has_variants());
        assert!(!SourceFormat::Svg.has_variants());
        assert!(SourceFormat::Raster.has_variants());
    }

    #[test]
    fn unsupported_extensions() {
        assert_eq!(SourceFormat::from_path(Path::new("a.gif")), None);
        assert_eq!(SourceFormat::from_path(Path::new("a.tiff")), None);
        assert_eq!(SourceFormat::from_path(Path::new("noext")), None);
    }
}

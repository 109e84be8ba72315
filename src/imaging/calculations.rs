//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Width the primary `src` should cover: the smallest candidate at least
/// this wide is picked, otherwise the widest one.
pub const PRIMARY_TARGET_WIDTH: u32 = 1040;

/// A single responsive variant to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantSize {
    pub width: u32,
    pub height: u32,
}

/// Calculate which variant widths to generate and their heights.
///
/// Widths at or above the source width are skipped (never upscale, never
/// duplicate the original). Duplicates are dropped and the result is ordered
/// narrowest first. Heights keep the source aspect ratio and are at least 1.
///
/// # Examples
/// ```
/// # use microblog::imaging::{VariantSize, calculate_variant_sizes};
/// let sizes = calculate_variant_sizes((1000, 800), &[480, 720, 1080]);
/// assert_eq!(sizes, vec![
///     VariantSize { width: 480, height: 384 },
///     VariantSize { width: 720, height: 576 },
/// ]);
/// ```
pub fn calculate_variant_sizes(original: (u32, u32), widths: &[u32]) -> Vec<VariantSize> {
    let (orig_w, orig_h) = original;
    if orig_w == 0 || orig_h == 0 {
        return Vec::new();
    }

    let mut targets: Vec<u32> = widths
        .iter()
        .copied()
        .filter(|&w| w > 0 && w < orig_w)
        .collect();
    targets.sort_unstable();
    targets.dedup();

    targets
        .into_iter()
        .map(|width| {
            let height = (orig_h as f64 * width as f64 / orig_w as f64).round() as u32;
            VariantSize {
                width,
                height: height.max(1),
            }
        })
        .collect()
}

/// Pick the index of the primary candidate from a list of widths.
///
/// Returns the smallest width `>= target`, else the largest width.
/// `None` only for an empty list.
pub fn choose_primary(widths: &[u32], target: u32) -> Option<usize> {
    let at_least = widths
        .iter()
        .enumerate()
        .filter(|&(_, &w)| w >= target)
        .min_by_key(|&(_, &w)| w)
        .map(|(i, _)| i);
    at_least.or_else(|| {
        widths
            .iter()
            .enumerate()
            .max_by_key(|&(_, &w)| w)
            .map(|(i, _)| i)
    })
}

/// Portrait or square images are the likely largest paint on a phone.
pub fn is_lcp_candidate(width: u32, height: u32) -> bool {
    height >= width
}

//! Edge detection entry point and edge map inversion.
//!
//! [`detect_edges`] wraps [`crate::canny::canny`] and returns a binary
//! image where white pixels (255) are edges and black pixels (0) are
//! background. [`invert`] flips any 8-bit image, turning an edge map into
//! dark edges on a white background.

use image::GrayImage;

use crate::types::GradientNorm;

/// Order a threshold pair as `(low, high)`.
///
/// The configuration does not constrain which threshold is larger; the
/// smaller one always acts as the hysteresis low cutoff.
#[must_use]
pub fn ordered_thresholds(threshold1: f32, threshold2: f32) -> (f32, f32) {
    if threshold1 > threshold2 {
        (threshold2, threshold1)
    } else {
        (threshold1, threshold2)
    }
}

/// Detect edges using the Canny algorithm.
///
/// Returns a binary image: 255 for edge pixels, 0 for non-edge.
///
/// Pixels whose gradient magnitude exceeds the high threshold are
/// definite edges; those above the low threshold are edges only if
/// connected to a definite edge. Reversed thresholds are swapped.
#[must_use = "returns the binary edge map"]
pub fn detect_edges(
    image: &GrayImage,
    threshold1: f32,
    threshold2: f32,
    norm: GradientNorm,
) -> GrayImage {
    let (low, high) = ordered_thresholds(threshold1, threshold2);
    crate::canny::canny(image, low, high, norm)
}

/// Invert an 8-bit image (bitwise NOT, i.e. `255 - v`).
#[must_use = "returns the inverted image"]
pub fn invert(image: &GrayImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        image::Luma([!image.get_pixel(x, y).0[0]])
    })
}

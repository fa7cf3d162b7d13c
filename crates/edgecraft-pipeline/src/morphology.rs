//! Morphological dilation, erosion, and closing with a rectangular
//! all-ones [`StructuringElement`].
//!
//! For an element cell at offset `(dx, dy)` from the anchor, pixel
//! `(x, y)` samples `(x + dx, y + dy)`. Dilation takes the maximum over
//! those samples and erosion the minimum; samples that fall outside the
//! image are skipped, so borders never pull values up or down.

use image::GrayImage;

use crate::types::StructuringElement;

fn reduce(image: &GrayImage, element: StructuringElement, pick: fn(u8, u8) -> u8, init: u8) -> GrayImage {
    let (w, h) = image.dimensions();
    let offsets = element.offsets();
    let (wi, hi) = (i64::from(w), i64::from(h));

    GrayImage::from_fn(w, h, |x, y| {
        let mut acc = init;
        for &(dx, dy) in &offsets {
            let (sx, sy) = (i64::from(x) + dx, i64::from(y) + dy);
            if (0..wi).contains(&sx) && (0..hi).contains(&sy) {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let sample = image.get_pixel(sx as u32, sy as u32).0[0];
                acc = pick(acc, sample);
            }
        }
        image::Luma([acc])
    })
}

/// Grow bright regions by the element.
#[must_use = "returns the dilated image"]
pub fn dilate(image: &GrayImage, element: StructuringElement) -> GrayImage {
    reduce(image, element, u8::max, u8::MIN)
}

/// Shrink bright regions by the element.
#[must_use = "returns the eroded image"]
pub fn erode(image: &GrayImage, element: StructuringElement) -> GrayImage {
    reduce(image, element, u8::min, u8::MAX)
}

/// Morphological closing: dilate, then erode with the same element.
///
/// Bridges gaps between nearby edge pixels that are narrower than the
/// element. With an even-sized element the anchor is off-centre, so the
/// closed result sits one pixel towards the bottom-right of the input.
#[must_use = "returns the closed image"]
pub fn close(image: &GrayImage, element: StructuringElement) -> GrayImage {
    erode(&dilate(image, element), element)
}

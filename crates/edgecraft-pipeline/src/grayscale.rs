//! Image decoding and single-channel conversion.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces the
//! in-memory original. [`to_single_channel`] is the conversion half of
//! the preprocessor: it guarantees the one-channel invariant every later
//! stage relies on.

use image::{DynamicImage, GrayImage};

use crate::types::{LoadMode, PipelineError};

/// Decode raw image bytes.
///
/// In [`LoadMode::Grayscale`] the result is always an 8-bit luma image.
/// In [`LoadMode::Color`] the decoded channel layout is kept as-is.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8], mode: LoadMode) -> Result<DynamicImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(match mode {
        LoadMode::Grayscale => DynamicImage::ImageLuma8(img.into_luma8()),
        LoadMode::Color => img,
    })
}

/// Whether `image` already satisfies the single-channel invariant.
#[must_use]
pub const fn is_single_channel(image: &DynamicImage) -> bool {
    matches!(image, DynamicImage::ImageLuma8(_))
}

/// Reduce `image` to one 8-bit channel.
///
/// An 8-bit luma image is returned unchanged. Everything else (color,
/// alpha, 16-bit or float samples) goes through the `image` crate's
/// luminance conversion, which drops alpha.
#[must_use = "returns the single-channel image"]
pub fn to_single_channel(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => other.to_luma8(),
    }
}

//! Gaussian blur for noise reduction before edge detection.
//!
//! [`gaussian_blur`] convolves with a fixed-size, separable Gaussian
//! kernel (5x5 with sigma 1.4 by default). Borders are extended with
//! reflect-101 (`dcb|abcd|cba`) and each output sample is rounded to the
//! nearest integer, so a uniform image comes back bit-identical.
//!
//! A kernel size of zero hands the image to
//! [`imageproc::filter::gaussian_blur_f32`], which sizes the kernel from
//! sigma alone.

use image::{DynamicImage, GrayImage};

use crate::types::PipelineConfig;

/// Sigma used when none is given, derived from the kernel size.
#[must_use]
pub fn sigma_for_kernel(size: u32) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let size = size as f32;
    0.3f32.mul_add((size - 1.0).mul_add(0.5, -1.0), 0.8)
}

/// Normalized 1-D Gaussian weights of length `size`.
///
/// Non-positive `sigma` is replaced by [`sigma_for_kernel`].
#[must_use]
pub fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let sigma = if sigma > 0.0 { sigma } else { sigma_for_kernel(size) };
    let center = f64::from(size.saturating_sub(1)) / 2.0;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);

    let raw: Vec<f64> = (0..size)
        .map(|i| {
            let d = f64::from(i) - center;
            (-(d * d) / denom).exp()
        })
        .collect();
    let total: f64 = raw.iter().sum();

    #[allow(clippy::cast_possible_truncation)]
    raw.iter().map(|w| (w / total) as f32).collect()
}

/// Map an out-of-range coordinate back into `0..len` by reflect-101.
fn reflect_101(mut pos: i64, len: i64) -> i64 {
    if len == 1 {
        return 0;
    }
    loop {
        if pos < 0 {
            pos = -pos;
        } else if pos >= len {
            pos = 2 * len - 2 - pos;
        } else {
            return pos;
        }
    }
}

/// Apply a `kernel_size` x `kernel_size` Gaussian blur.
///
/// `kernel_size` must be odd, or zero to let `imageproc` pick the extent
/// from `sigma` (in which case a non-positive sigma returns the image
/// unchanged, since `imageproc` panics on `sigma <= 0.0`).
#[must_use = "returns the blurred image"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn gaussian_blur(image: &GrayImage, kernel_size: u32, sigma: f32) -> GrayImage {
    if kernel_size == 0 {
        if sigma <= 0.0 {
            return image.clone();
        }
        return imageproc::filter::gaussian_blur_f32(image, sigma);
    }

    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || kernel_size == 1 {
        return image.clone();
    }

    let kernel = gaussian_kernel(kernel_size, sigma);
    let radius = i64::from(kernel_size / 2);
    let (wi, hi) = (i64::from(w), i64::from(h));
    let src = image.as_raw();

    // Horizontal pass into a float buffer, vertical pass rounds once.
    let mut rows = vec![0.0f32; src.len()];
    for y in 0..hi {
        let row = (y * wi) as usize;
        for x in 0..wi {
            let mut acc = 0.0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = reflect_101(x + k as i64 - radius, wi) as usize;
                acc += weight * f32::from(src[row + sx]);
            }
            rows[row + x as usize] = acc;
        }
    }

    GrayImage::from_fn(w, h, |x, y| {
        let (x, y) = (i64::from(x), i64::from(y));
        let mut acc = 0.0f32;
        for (k, weight) in kernel.iter().enumerate() {
            let sy = reflect_101(y + k as i64 - radius, hi);
            acc += weight * rows[(sy * wi + x) as usize];
        }
        image::Luma([acc.round().clamp(0.0, 255.0) as u8])
    })
}

/// The preprocessor: reduce to one channel, then blur with the
/// configured kernel.
#[must_use = "returns the blurred single-channel image"]
pub fn preprocess(image: &DynamicImage, config: &PipelineConfig) -> GrayImage {
    preprocess_keeping_gray(image, config).1
}

/// [`preprocess`], also returning the single-channel image it blurred.
#[must_use = "returns the single-channel and blurred images"]
pub fn preprocess_keeping_gray(
    image: &DynamicImage,
    config: &PipelineConfig,
) -> (GrayImage, GrayImage) {
    let gray = crate::grayscale::to_single_channel(image);
    let blurred = gaussian_blur(&gray, config.blur_kernel_size, config.blur_sigma);
    (gray, blurred)
}

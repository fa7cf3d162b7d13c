//! Side-by-side comparison of the original and processed images.
//!
//! The comparison is composed as one RGB raster: original on the left,
//! processed on the right, separated by a neutral gutter. Grayscale
//! sources are replicated across the three channels. No captions are
//! rendered.

use std::path::{Path, PathBuf};

use edgecraft_pipeline::{DynamicImage, GrayImage};
use image::{ImageEncoder, Rgb, RgbImage};
use log::info;

/// Caption of the left panel.
pub const ORIGINAL_TITLE: &str = "Original Image";

/// Caption of the right panel.
pub const PROCESSED_TITLE: &str = "Processed Image";

/// Width in pixels of the gutter between the two panels.
pub const DEFAULT_GUTTER: u32 = 16;

const GUTTER_COLOR: Rgb<u8> = Rgb([128, 128, 128]);

/// Errors that can occur while presenting a comparison.
#[derive(Debug, thiserror::Error)]
pub enum PresentError {
    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    /// The encoded comparison could not be written.
    #[error("could not write comparison to {}: {source}", path.display())]
    Write {
        /// Destination that was requested.
        path: PathBuf,
        /// Underlying write error.
        #[source]
        source: std::io::Error,
    },
}

/// Shows an (original, processed) pair to the user.
pub trait Presenter {
    /// Present `original` and `processed` side by side.
    ///
    /// # Errors
    ///
    /// Returns [`PresentError`] if the comparison cannot be produced.
    fn present(&mut self, original: &DynamicImage, processed: &GrayImage)
    -> Result<(), PresentError>;
}

/// Compose the two images into a single side-by-side raster.
///
/// Panels are top-aligned; any area below the shorter panel is filled
/// with the gutter color.
#[must_use]
pub fn side_by_side(original: &DynamicImage, processed: &GrayImage, gutter: u32) -> RgbImage {
    let left = original.to_rgb8();
    let width = left.width() + gutter + processed.width();
    let height = left.height().max(processed.height());
    let mut canvas = RgbImage::from_pixel(width, height, GUTTER_COLOR);

    for (x, y, px) in left.enumerate_pixels() {
        canvas.put_pixel(x, y, *px);
    }
    let offset = left.width() + gutter;
    for (x, y, px) in processed.enumerate_pixels() {
        let v = px.0[0];
        canvas.put_pixel(offset + x, y, Rgb([v, v, v]));
    }
    canvas
}

/// Encode an RGB image as PNG bytes.
///
/// # Errors
///
/// Returns [`PresentError::Encode`] if encoding fails.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, PresentError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(png_bytes)
}

/// [`Presenter`] that writes the comparison to a PNG file.
///
/// The PNG holds only the two panels and the gutter. The panel titles
/// [`ORIGINAL_TITLE`] and [`PROCESSED_TITLE`] are not drawn into it; they
/// are recorded in the log line emitted for each write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonPresenter {
    output: PathBuf,
    gutter: u32,
}

impl ComparisonPresenter {
    /// Presenter writing to `output` with the default gutter.
    #[must_use]
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            gutter: DEFAULT_GUTTER,
        }
    }

    /// Override the gutter width.
    #[must_use]
    pub const fn with_gutter(mut self, gutter: u32) -> Self {
        self.gutter = gutter;
        self
    }

    /// Where the comparison is written.
    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl Presenter for ComparisonPresenter {
    fn present(
        &mut self,
        original: &DynamicImage,
        processed: &GrayImage,
    ) -> Result<(), PresentError> {
        let canvas = side_by_side(original, processed, self.gutter);
        let png = encode_png(&canvas)?;
        std::fs::write(&self.output, &png).map_err(|source| PresentError::Write {
            path: self.output.clone(),
            source,
        })?;
        info!(
            "wrote \"{ORIGINAL_TITLE}\" | \"{PROCESSED_TITLE}\" ({}x{}) to {}",
            canvas.width(),
            canvas.height(),
            self.output.display(),
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Luma;

    use super::*;

    #[test]
    fn side_by_side_places_panels() {
        let original = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 2, Luma([10])));
        let processed = GrayImage::from_pixel(3, 2, Luma([255]));
        let canvas = side_by_side(&original, &processed, 4);

        assert_eq!(canvas.dimensions(), (10, 2));
        assert_eq!(canvas.get_pixel(0, 0), &Rgb([10, 10, 10]));
        assert_eq!(canvas.get_pixel(3, 1), &GUTTER_COLOR);
        assert_eq!(canvas.get_pixel(9, 1), &Rgb([255, 255, 255]));
    }

    #[test]
    fn side_by_side_keeps_color_original() {
        let original = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([200, 0, 50])));
        let processed = GrayImage::new(2, 2);
        let canvas = side_by_side(&original, &processed, 0);
        assert_eq!(canvas.get_pixel(1, 1), &Rgb([200, 0, 50]));
        assert_eq!(canvas.get_pixel(2, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn side_by_side_pads_shorter_panel() {
        let original = DynamicImage::ImageLuma8(GrayImage::new(2, 5));
        let processed = GrayImage::new(2, 3);
        let canvas = side_by_side(&original, &processed, 1);
        assert_eq!(canvas.dimensions(), (5, 5));
        assert_eq!(canvas.get_pixel(4, 4), &GUTTER_COLOR);
    }

    #[test]
    fn encode_png_produces_valid_png() {
        let png = encode_png(&RgbImage::new(4, 4)).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn comparison_presenter_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comparison.png");
        let mut presenter = ComparisonPresenter::new(&path).with_gutter(2);

        let original = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
        let processed = GrayImage::from_pixel(4, 4, Luma([255]));
        presenter.present(&original, &processed).unwrap();

        let written = image::open(&path).unwrap().to_rgb8();
        assert_eq!(written.dimensions(), (10, 4));
        assert_eq!(written.get_pixel(9, 3), &Rgb([255, 255, 255]));
    }

    #[test]
    fn written_comparison_has_no_caption_band() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comparison.png");
        let mut presenter = ComparisonPresenter::new(&path);

        let original = DynamicImage::ImageLuma8(GrayImage::from_pixel(7, 5, Luma([40])));
        let processed = GrayImage::from_pixel(7, 5, Luma([255]));
        presenter.present(&original, &processed).unwrap();

        let written = image::open(&path).unwrap().to_rgb8();
        assert_eq!(written, side_by_side(&original, &processed, DEFAULT_GUTTER));
        assert_eq!(written.height(), 5);
        assert_eq!(written.get_pixel(0, 0), &Rgb([40, 40, 40]));
    }

    #[test]
    fn comparison_presenter_reports_write_failure() {
        let mut presenter = ComparisonPresenter::new("/nonexistent/dir/out.png");
        let result = presenter.present(
            &DynamicImage::ImageLuma8(GrayImage::new(1, 1)),
            &GrayImage::new(1, 1),
        );
        assert!(matches!(result, Err(PresentError::Write { .. })));
    }
}

//! edgecraft-pipeline: pure edge-detection pipeline (sans-IO).
//!
//! Turns an image into a cleaned, inverted edge map through:
//! decode -> single channel -> Gaussian blur -> Canny -> closing ->
//! invert -> (second Canny + closing on the inverted map).
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns images. Filesystem access and presentation
//! live in `edgecraft-io`.

pub mod blur;
pub mod canny;
pub mod diagnostics;
pub mod edge;
pub mod grayscale;
pub mod morphology;
pub mod pipeline;
pub mod types;

pub use blur::preprocess;
pub use edge::{detect_edges, invert};
pub use morphology::close as clean_edges;
pub use pipeline::Pipeline;
pub use types::{
    DynamicImage, GradientNorm, GrayImage, LoadMode, PipelineConfig, PipelineError,
    ProcessResult, StagedResult, StructuringElement,
};

/// Run the pipeline and keep every intermediate.
///
/// # Pipeline steps
///
/// 1. Decode the image (grayscale unless `config.load_mode` is `Color`)
/// 2. Reduce to one channel and Gaussian-blur
/// 3. Canny edge detection
/// 4. Morphological closing
/// 5. Inversion -- this is the processed output
/// 6. Canny on the inverted map (when `config.second_pass`)
/// 7. Closing of that second edge map (when `config.second_pass`)
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if the config fails validation,
/// [`PipelineError::EmptyInput`] if `image_bytes` is empty, and
/// [`PipelineError::ImageDecode`] if the image format is unrecognized.
pub fn process_staged(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<StagedResult, PipelineError> {
    Ok(Pipeline::new(image_bytes.to_vec(), config.clone())
        .decode()?
        .preprocess()
        .detect_edges()
        .clean_edges()
        .invert()
        .redetect()
        .into_result())
}

/// Run the pipeline and return `(original, processed)`.
///
/// The processed image is the inverted, cleaned edge map from step 5;
/// the second pass never feeds into it.
///
/// # Errors
///
/// Same as [`process_staged`].
pub fn process_bytes(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    process_staged(image_bytes, config).map(ProcessResult::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode_png(img: &GrayImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    /// Left half black, right half white.
    fn sharp_edge_png(width: u32, height: u32) -> Vec<u8> {
        encode_png(&GrayImage::from_fn(width, height, |x, _y| {
            if x < width / 2 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        }))
    }

    #[test]
    fn process_empty_input() {
        let result = process_bytes(&[], &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn process_corrupt_input() {
        let result = process_bytes(&[0xFF, 0x00], &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn black_image_becomes_white() {
        let png = encode_png(&GrayImage::new(100, 100));
        let result = process_bytes(&png, &PipelineConfig::default()).unwrap();
        assert_eq!(result.original, DynamicImage::ImageLuma8(GrayImage::new(100, 100)));
        assert_eq!(result.processed, GrayImage::from_pixel(100, 100, image::Luma([255])));
    }

    #[test]
    fn sharp_edge_yields_dark_edge_pixels() {
        let result = process_bytes(&sharp_edge_png(40, 40), &PipelineConfig::default()).unwrap();
        assert_eq!(result.processed.dimensions(), (40, 40));
        let dark = result.processed.pixels().filter(|p| p.0[0] == 0).count();
        assert!(dark > 0, "expected dark edge pixels in processed output");
        assert!(result.processed.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn processed_matches_manual_composition() {
        let png = sharp_edge_png(24, 24);
        let config = PipelineConfig::interactive();
        let result = process_bytes(&png, &config).unwrap();

        let original = grayscale::decode(&png, config.load_mode).unwrap();
        let blurred = preprocess(&original, &config);
        let edges = detect_edges(&blurred, config.canny_low, config.canny_high, config.gradient_norm);
        let cleaned = clean_edges(&edges, config.structuring_element);
        assert_eq!(result.processed, invert(&cleaned));
        assert_eq!(result.original, original);
    }

    #[test]
    fn process_is_deterministic() {
        let png = sharp_edge_png(33, 17);
        let config = PipelineConfig::default();
        let first = process_staged(&png, &config).unwrap();
        let second = process_staged(&png, &config).unwrap();
        assert_eq!(first, second);
    }
}

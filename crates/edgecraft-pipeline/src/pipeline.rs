//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::process_staged`] which runs the entire pipeline in one
//! call, [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use edgecraft_pipeline::{Pipeline, PipelineConfig, PipelineError};
//! # fn run(png: Vec<u8>) -> Result<(), PipelineError> {
//! let staged = Pipeline::new(png, PipelineConfig::default())
//!     .decode()?
//!     .preprocess()
//!     .detect_edges()
//!     .clean_edges()
//!     .invert()
//!     .redetect()
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state,
//! carrying all previously computed intermediates. Only [`Pending::decode`]
//! can fail; every later stage is total over a decoded image.

use image::DynamicImage;
use log::debug;

use crate::diagnostics::{StageMetrics, count_pixels};
use crate::types::{GrayImage, PipelineConfig, PipelineError, StagedResult};

/// Entry point of the incremental pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Start a pipeline over raw image bytes.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(source: Vec<u8>, config: PipelineConfig) -> Pending {
        Pending { config, source }
    }
}

/// Trait implemented by every processed pipeline stage.
pub trait PipelineStage {
    /// Human-readable name of this stage (e.g. `"decode"`, `"invert"`).
    const NAME: &str;

    /// One-based position of this stage in the sequence.
    const INDEX: usize;

    /// Stage-specific metrics for diagnostics.
    fn metrics(&self) -> StageMetrics;
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
#[must_use = "pipeline stages are consumed by advancing; call .decode() to continue"]
pub struct Pending {
    config: PipelineConfig,
    source: Vec<u8>,
}

impl Pending {
    /// The raw source image bytes.
    #[must_use]
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Validate the config, decode the source, and advance to [`Decoded`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if the config fails
    /// [`PipelineConfig::validate`]. Returns [`PipelineError::EmptyInput`]
    /// if the source bytes are empty, or [`PipelineError::ImageDecode`]
    /// if the image format is unrecognized or the data is corrupt.
    pub fn decode(self) -> Result<Decoded, PipelineError> {
        self.config.validate()?;
        let source_len = self.source.len();
        let original = crate::grayscale::decode(&self.source, self.config.load_mode)?;
        debug!(
            "decoded {source_len} bytes as {}x{} ({} mode)",
            original.width(),
            original.height(),
            self.config.load_mode,
        );
        Ok(Decoded {
            config: self.config,
            original,
            source_len,
        })
    }
}

// ───────────────────────── Stage 1: Decoded ──────────────────────────

/// Pipeline state after decoding the source image.
#[must_use = "pipeline stages are consumed by advancing; call .preprocess() to continue"]
pub struct Decoded {
    config: PipelineConfig,
    original: DynamicImage,
    source_len: usize,
}

impl Decoded {
    /// The image as loaded.
    #[must_use]
    pub const fn original(&self) -> &DynamicImage {
        &self.original
    }

    /// Reduce to one channel and blur.
    pub fn preprocess(self) -> Preprocessed {
        let converted = !crate::grayscale::is_single_channel(&self.original);
        let (grayscale, blurred) =
            crate::blur::preprocess_keeping_gray(&self.original, &self.config);
        debug!(
            "preprocessed: converted={converted} kernel={} sigma={}",
            self.config.blur_kernel_size, self.config.blur_sigma,
        );
        Preprocessed {
            config: self.config,
            original: self.original,
            grayscale,
            blurred,
            converted,
        }
    }
}

// ───────────────────────── Stage 2: Preprocessed ─────────────────────

/// Pipeline state after single-channel conversion and Gaussian blur.
#[must_use = "pipeline stages are consumed by advancing; call .detect_edges() to continue"]
pub struct Preprocessed {
    config: PipelineConfig,
    original: DynamicImage,
    grayscale: GrayImage,
    blurred: GrayImage,
    converted: bool,
}

impl Preprocessed {
    /// The single-channel image before blurring.
    #[must_use]
    pub const fn grayscale(&self) -> &GrayImage {
        &self.grayscale
    }

    /// The blurred image.
    #[must_use]
    pub const fn blurred(&self) -> &GrayImage {
        &self.blurred
    }

    /// Run Canny edge detection on the blurred image.
    pub fn detect_edges(self) -> EdgesDetected {
        let thresholds =
            crate::edge::ordered_thresholds(self.config.canny_low, self.config.canny_high);
        let edges = crate::edge::detect_edges(
            &self.blurred,
            thresholds.0,
            thresholds.1,
            self.config.gradient_norm,
        );
        debug!(
            "edges detected: low={} high={} norm={}",
            thresholds.0, thresholds.1, self.config.gradient_norm,
        );
        EdgesDetected {
            config: self.config,
            original: self.original,
            grayscale: self.grayscale,
            blurred: self.blurred,
            edges,
            thresholds,
        }
    }
}

// ───────────────────────── Stage 3: EdgesDetected ────────────────────

/// Pipeline state after the first edge detection pass.
#[must_use = "pipeline stages are consumed by advancing; call .clean_edges() to continue"]
pub struct EdgesDetected {
    config: PipelineConfig,
    original: DynamicImage,
    grayscale: GrayImage,
    blurred: GrayImage,
    edges: GrayImage,
    thresholds: (f32, f32),
}

impl EdgesDetected {
    /// The binary edge map.
    #[must_use]
    pub const fn edges(&self) -> &GrayImage {
        &self.edges
    }

    /// Close small gaps in the edge map.
    pub fn clean_edges(self) -> Cleaned {
        let cleaned = crate::morphology::close(&self.edges, self.config.structuring_element);
        Cleaned {
            config: self.config,
            original: self.original,
            grayscale: self.grayscale,
            blurred: self.blurred,
            edges: self.edges,
            cleaned,
        }
    }
}

// ───────────────────────── Stage 4: Cleaned ──────────────────────────

/// Pipeline state after morphological closing.
#[must_use = "pipeline stages are consumed by advancing; call .invert() to continue"]
pub struct Cleaned {
    config: PipelineConfig,
    original: DynamicImage,
    grayscale: GrayImage,
    blurred: GrayImage,
    edges: GrayImage,
    cleaned: GrayImage,
}

impl Cleaned {
    /// The closed edge map.
    #[must_use]
    pub const fn cleaned(&self) -> &GrayImage {
        &self.cleaned
    }

    /// Invert the closed edge map.
    pub fn invert(self) -> Inverted {
        let inverted = crate::edge::invert(&self.cleaned);
        Inverted {
            config: self.config,
            original: self.original,
            grayscale: self.grayscale,
            blurred: self.blurred,
            edges: self.edges,
            cleaned: self.cleaned,
            inverted,
        }
    }
}

// ───────────────────────── Stage 5: Inverted ─────────────────────────

/// Pipeline state after inversion. The inverted map is the processed
/// output.
#[must_use = "pipeline stages are consumed by advancing; call .redetect() to continue"]
pub struct Inverted {
    config: PipelineConfig,
    original: DynamicImage,
    grayscale: GrayImage,
    blurred: GrayImage,
    edges: GrayImage,
    cleaned: GrayImage,
    inverted: GrayImage,
}

impl Inverted {
    /// The inverted edge map.
    #[must_use]
    pub const fn inverted(&self) -> &GrayImage {
        &self.inverted
    }

    /// Re-run edge detection and closing on the inverted map when
    /// `config.second_pass` is set; otherwise pass through.
    pub fn redetect(self) -> Redetected {
        let (final_edges, final_cleaned) = if self.config.second_pass {
            let edges = crate::edge::detect_edges(
                &self.inverted,
                self.config.canny_low,
                self.config.canny_high,
                self.config.gradient_norm,
            );
            let cleaned = crate::morphology::close(&edges, self.config.structuring_element);
            debug!("second pass complete");
            (Some(edges), Some(cleaned))
        } else {
            (None, None)
        };
        Redetected {
            staged: StagedResult {
                original: self.original,
                grayscale: self.grayscale,
                blurred: self.blurred,
                edges: self.edges,
                cleaned: self.cleaned,
                inverted: self.inverted,
                final_edges,
                final_cleaned,
            },
        }
    }
}

// ───────────────────────── Stage 6: Redetected ───────────────────────

/// Final pipeline state.
#[must_use = "call .into_result() to take the staged output"]
pub struct Redetected {
    staged: StagedResult,
}

impl Redetected {
    /// Second-pass edges, if the pass ran.
    #[must_use]
    pub const fn final_edges(&self) -> Option<&GrayImage> {
        self.staged.final_edges.as_ref()
    }

    /// Second-pass cleaned edges, if the pass ran.
    #[must_use]
    pub const fn final_cleaned(&self) -> Option<&GrayImage> {
        self.staged.final_cleaned.as_ref()
    }

    /// Consume the pipeline and return the full [`StagedResult`].
    pub fn into_result(self) -> StagedResult {
        self.staged
    }
}

// ───────────────────────── Stage metrics ─────────────────────────────

fn pixel_count(image: &GrayImage) -> u64 {
    u64::from(image.width()) * u64::from(image.height())
}

impl PipelineStage for Decoded {
    const NAME: &str = "decode";
    const INDEX: usize = 1;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Decode {
            input_bytes: self.source_len,
            width: self.original.width(),
            height: self.original.height(),
            channels: self.original.color().channel_count(),
            pixel_count: u64::from(self.original.width()) * u64::from(self.original.height()),
        }
    }
}

impl PipelineStage for Preprocessed {
    const NAME: &str = "preprocess";
    const INDEX: usize = 2;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Preprocess {
            converted: self.converted,
            kernel_size: self.config.blur_kernel_size,
            sigma: self.config.blur_sigma,
        }
    }
}

impl PipelineStage for EdgesDetected {
    const NAME: &str = "edges";
    const INDEX: usize = 3;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::EdgeDetection {
            low_threshold: self.thresholds.0,
            high_threshold: self.thresholds.1,
            norm: self.config.gradient_norm.to_string(),
            edge_pixel_count: count_pixels(&self.edges, 255),
            total_pixel_count: pixel_count(&self.edges),
        }
    }
}

impl PipelineStage for Cleaned {
    const NAME: &str = "clean";
    const INDEX: usize = 4;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Cleaning {
            element_width: self.config.structuring_element.width,
            element_height: self.config.structuring_element.height,
            edges_before: count_pixels(&self.edges, 255),
            edges_after: count_pixels(&self.cleaned, 255),
        }
    }
}

impl PipelineStage for Inverted {
    const NAME: &str = "invert";
    const INDEX: usize = 5;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Invert {
            dark_pixel_count: count_pixels(&self.inverted, 0),
        }
    }
}

impl PipelineStage for Redetected {
    const NAME: &str = "redetect";
    const INDEX: usize = 6;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::SecondPass {
            edge_pixel_count: self.final_edges().map_or(0, |e| count_pixels(e, 255)),
            cleaned_pixel_count: self.final_cleaned().map_or(0, |e| count_pixels(e, 255)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn png_of(img: &GrayImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    /// Black square on a white field: strong closed outline.
    fn square_png() -> Vec<u8> {
        png_of(&GrayImage::from_fn(32, 32, |x, y| {
            if (8..24).contains(&x) && (8..24).contains(&y) {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        }))
    }

    #[test]
    fn invalid_config_fails_before_decoding() {
        let config = PipelineConfig {
            blur_kernel_size: 2,
            ..PipelineConfig::default()
        };
        let result = Pipeline::new(Vec::new(), config).decode();
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn empty_source_fails_to_decode() {
        let result = Pipeline::new(Vec::new(), PipelineConfig::default()).decode();
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn stages_chain_through_to_result() {
        let decoded = Pipeline::new(square_png(), PipelineConfig::default())
            .decode()
            .unwrap();
        assert_eq!(decoded.original().width(), 32);

        let preprocessed = decoded.preprocess();
        assert_eq!(preprocessed.grayscale().dimensions(), (32, 32));

        let detected = preprocessed.detect_edges();
        assert!(detected.edges().pixels().any(|p| p.0[0] == 255));

        let cleaned = detected.clean_edges();
        let inverted = cleaned.invert();
        assert!(inverted.inverted().pixels().any(|p| p.0[0] == 0));

        let redetected = inverted.redetect();
        assert!(redetected.final_edges().is_some());
        assert!(redetected.final_cleaned().is_some());

        let staged = redetected.into_result();
        assert_eq!(staged.inverted, crate::edge::invert(&staged.cleaned));
        assert_eq!(staged.processed(), &staged.inverted);
    }

    #[test]
    fn second_pass_can_be_skipped() {
        let config = PipelineConfig {
            second_pass: false,
            ..PipelineConfig::default()
        };
        let with = crate::process_staged(&square_png(), &PipelineConfig::default()).unwrap();
        let without = crate::process_staged(&square_png(), &config).unwrap();
        assert!(without.final_edges.is_none());
        assert!(without.final_cleaned.is_none());
        // The processed output does not depend on the second pass.
        assert_eq!(with.inverted, without.inverted);
    }

    #[test]
    fn color_mode_reports_conversion() {
        let config = PipelineConfig {
            load_mode: crate::LoadMode::Color,
            ..PipelineConfig::default()
        };
        let rgba = image::RgbaImage::from_pixel(6, 6, image::Rgba([10, 20, 30, 255]));
        let mut png = Vec::new();
        rgba.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let preprocessed = Pipeline::new(png, config).decode().unwrap().preprocess();
        assert!(matches!(
            preprocessed.metrics(),
            StageMetrics::Preprocess { converted: true, .. }
        ));
    }

    #[test]
    fn staged_preprocess_matches_public_preprocess() {
        let config = PipelineConfig {
            load_mode: crate::LoadMode::Color,
            blur_kernel_size: 7,
            ..PipelineConfig::default()
        };
        let rgb = image::RgbImage::from_fn(20, 12, |x, y| {
            image::Rgb([u8::try_from(x * 12).unwrap(), u8::try_from(y * 20).unwrap(), 90])
        });
        let mut png = Vec::new();
        rgb.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let preprocessed = Pipeline::new(png, config.clone()).decode().unwrap().preprocess();
        let expected = crate::preprocess(&DynamicImage::ImageRgb8(rgb), &config);
        assert_eq!(preprocessed.blurred(), &expected);
    }

    #[test]
    fn stage_names_and_indices_are_ordered() {
        assert_eq!(Decoded::NAME, "decode");
        let indices = [
            Decoded::INDEX,
            Preprocessed::INDEX,
            EdgesDetected::INDEX,
            Cleaned::INDEX,
            Inverted::INDEX,
            Redetected::INDEX,
        ];
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
    }
}

//! Shared types for the edgecraft edge-detection pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference
/// stage outputs without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `DynamicImage` so downstream crates can reference the
/// loaded original without depending on `image` directly.
pub use image::DynamicImage;

/// How the loader decodes the source image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Decode straight to a single 8-bit luma channel.
    #[default]
    Grayscale,
    /// Keep the decoded channel layout. The preprocessor converts it to
    /// a single channel before blurring.
    Color,
}

impl std::fmt::Display for LoadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Grayscale => f.write_str("grayscale"),
            Self::Color => f.write_str("color"),
        }
    }
}

/// Norm used to combine the horizontal and vertical Sobel responses
/// into a gradient magnitude.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientNorm {
    /// `|gx| + |gy|`.
    #[default]
    L1,
    /// `sqrt(gx² + gy²)`.
    L2,
}

impl std::fmt::Display for GradientNorm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::L1 => f.write_str("L1"),
            Self::L2 => f.write_str("L2"),
        }
    }
}

/// Rectangular all-ones structuring element for morphological
/// operations.
///
/// The anchor sits at `(width / 2, height / 2)`, so for the default 2x2
/// element the neighbourhood of `(x, y)` is `x-1..=x` by `y-1..=y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuringElement {
    /// Element width in pixels.
    pub width: u32,
    /// Element height in pixels.
    pub height: u32,
}

impl StructuringElement {
    /// The 2x2 element used by the default pipeline.
    pub const DEFAULT: Self = Self::rect(2, 2);

    /// Create a `width` x `height` all-ones element.
    #[must_use]
    pub const fn rect(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Anchor position inside the element.
    #[must_use]
    pub const fn anchor(self) -> (u32, u32) {
        (self.width / 2, self.height / 2)
    }

    /// Offsets of every element cell relative to the anchor, row-major.
    #[must_use]
    pub fn offsets(self) -> Vec<(i64, i64)> {
        let (ax, ay) = self.anchor();
        let cells = u64::from(self.width) * u64::from(self.height);
        let mut offsets = Vec::with_capacity(usize::try_from(cells).unwrap_or(0));
        for row in 0..self.height {
            for col in 0..self.width {
                offsets.push((i64::from(col) - i64::from(ax), i64::from(row) - i64::from(ay)));
            }
        }
        offsets
    }
}

impl Default for StructuringElement {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Configuration for the edge-detection pipeline.
///
/// Every field has a documented default exposed as an associated
/// `DEFAULT_*` constant. Missing fields in a serialized config fall back
/// to those defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How the source image is decoded.
    pub load_mode: LoadMode,

    /// Side length of the square Gaussian kernel. Must be odd, or zero
    /// to derive the kernel extent from `blur_sigma`.
    pub blur_kernel_size: u32,

    /// Gaussian standard deviation. Non-positive values derive sigma
    /// from `blur_kernel_size`.
    pub blur_sigma: f32,

    /// Hysteresis low cutoff on the gradient magnitude.
    ///
    /// No ordering against `canny_high` is enforced: the detector uses the
    /// smaller of the two as the low cutoff.
    pub canny_low: f32,

    /// Hysteresis high cutoff on the gradient magnitude.
    pub canny_high: f32,

    /// How Sobel responses are combined into a magnitude.
    pub gradient_norm: GradientNorm,

    /// Element used by the closing that cleans each edge map.
    pub structuring_element: StructuringElement,

    /// Whether to re-run edge detection and cleaning on the inverted map.
    ///
    /// The second pass never changes [`ProcessResult::processed`]; its
    /// outputs are only kept in [`StagedResult`] and diagnostics.
    pub second_pass: bool,
}

impl PipelineConfig {
    /// Default load mode.
    pub const DEFAULT_LOAD_MODE: LoadMode = LoadMode::Grayscale;
    /// Default Gaussian kernel side length.
    pub const DEFAULT_BLUR_KERNEL_SIZE: u32 = 5;
    /// Default Gaussian sigma.
    pub const DEFAULT_BLUR_SIGMA: f32 = 1.4;
    /// Default low threshold for direct pipeline calls.
    pub const DEFAULT_CANNY_LOW: f32 = 50.0;
    /// Default high threshold for direct pipeline calls.
    pub const DEFAULT_CANNY_HIGH: f32 = 50.0;
    /// Low threshold used when an image is picked interactively.
    pub const INTERACTIVE_CANNY_LOW: f32 = 48.0;
    /// High threshold used when an image is picked interactively.
    pub const INTERACTIVE_CANNY_HIGH: f32 = 53.0;
    /// Default gradient norm.
    pub const DEFAULT_GRADIENT_NORM: GradientNorm = GradientNorm::L1;
    /// Default closing element.
    pub const DEFAULT_STRUCTURING_ELEMENT: StructuringElement = StructuringElement::DEFAULT;
    /// Largest accepted Gaussian kernel side length.
    pub const MAX_BLUR_KERNEL_SIZE: u32 = 255;
    /// Largest accepted Gaussian sigma.
    pub const MAX_BLUR_SIGMA: f32 = 100.0;
    /// Largest accepted structuring element side length.
    pub const MAX_STRUCTURING_ELEMENT_SIDE: u32 = 255;

    /// Preset used by the image-selection entry point: identical to the
    /// default except for the (48, 53) threshold pair.
    #[must_use]
    pub fn interactive() -> Self {
        Self {
            canny_low: Self::INTERACTIVE_CANNY_LOW,
            canny_high: Self::INTERACTIVE_CANNY_HIGH,
            ..Self::default()
        }
    }

    /// Check the configuration for values the stages cannot honour.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] describing the first
    /// offending field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.blur_kernel_size % 2 == 0 && self.blur_kernel_size != 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "blur_kernel_size must be odd, got {}",
                self.blur_kernel_size,
            )));
        }
        if self.blur_kernel_size > Self::MAX_BLUR_KERNEL_SIZE {
            return Err(PipelineError::InvalidConfig(format!(
                "blur_kernel_size must be at most {}, got {}",
                Self::MAX_BLUR_KERNEL_SIZE,
                self.blur_kernel_size,
            )));
        }
        if !self.blur_sigma.is_finite() || self.blur_sigma > Self::MAX_BLUR_SIGMA {
            return Err(PipelineError::InvalidConfig(format!(
                "blur_sigma must be finite and at most {}, got {}",
                Self::MAX_BLUR_SIGMA,
                self.blur_sigma,
            )));
        }
        if self.blur_kernel_size == 0 && self.blur_sigma <= 0.0 {
            return Err(PipelineError::InvalidConfig(
                "blur_kernel_size and blur_sigma cannot both be unset".to_string(),
            ));
        }
        for (name, value) in [("canny_low", self.canny_low), ("canny_high", self.canny_high)] {
            if !value.is_finite() || value < 0.0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "{name} must be a finite non-negative number, got {value}",
                )));
            }
        }
        if self.structuring_element.width == 0 || self.structuring_element.height == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "structuring element must be at least 1x1, got {}x{}",
                self.structuring_element.width, self.structuring_element.height,
            )));
        }
        if self.structuring_element.width > Self::MAX_STRUCTURING_ELEMENT_SIDE
            || self.structuring_element.height > Self::MAX_STRUCTURING_ELEMENT_SIDE
        {
            return Err(PipelineError::InvalidConfig(format!(
                "structuring element sides must be at most {}, got {}x{}",
                Self::MAX_STRUCTURING_ELEMENT_SIDE,
                self.structuring_element.width,
                self.structuring_element.height,
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            load_mode: Self::DEFAULT_LOAD_MODE,
            blur_kernel_size: Self::DEFAULT_BLUR_KERNEL_SIZE,
            blur_sigma: Self::DEFAULT_BLUR_SIGMA,
            canny_low: Self::DEFAULT_CANNY_LOW,
            canny_high: Self::DEFAULT_CANNY_HIGH,
            gradient_norm: Self::DEFAULT_GRADIENT_NORM,
            structuring_element: Self::DEFAULT_STRUCTURING_ELEMENT,
            second_pass: true,
        }
    }
}

/// Result of running the pipeline: the loaded image and the processed
/// edge map.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessResult {
    /// The image exactly as loaded.
    pub original: DynamicImage,
    /// The inverted, cleaned edge map (white background, black edges).
    pub processed: GrayImage,
}

/// Result of running the pipeline with every intermediate preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedResult {
    /// Stage 1: the image as loaded.
    pub original: DynamicImage,
    /// Stage 2a: single-channel image fed to the blur.
    pub grayscale: GrayImage,
    /// Stage 2b: Gaussian-blurred image.
    pub blurred: GrayImage,
    /// Stage 3: binary edge map.
    pub edges: GrayImage,
    /// Stage 4: edge map after closing.
    pub cleaned: GrayImage,
    /// Stage 5: inverted cleaned edges. This is the processed output.
    pub inverted: GrayImage,
    /// Stage 6: edges re-detected on the inverted map (second pass only).
    pub final_edges: Option<GrayImage>,
    /// Stage 7: re-detected edges after closing (second pass only).
    pub final_cleaned: Option<GrayImage>,
}

impl StagedResult {
    /// The processed output: the inverted map, never the second pass.
    #[must_use]
    pub const fn processed(&self) -> &GrayImage {
        &self.inverted
    }
}

impl From<StagedResult> for ProcessResult {
    fn from(staged: StagedResult) -> Self {
        Self {
            original: staged.original,
            processed: staged.inverted,
        }
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

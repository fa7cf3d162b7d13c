//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! [`process_staged_with_diagnostics`] runs the same stage sequence as
//! [`crate::process_staged`] while timing every step through a [`Clock`].
//! [`SystemClock`] reads `web_time::Instant`, which is
//! `std::time::Instant` on native targets.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::{Pipeline, PipelineStage};
use crate::types::{PipelineConfig, PipelineError, StagedResult};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Current timestamp.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// [`Clock`] backed by `web_time::Instant`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Instant = web_time::Instant;

    fn now(&self) -> Self::Instant {
        web_time::Instant::now()
    }

    fn elapsed(&self, since: &Self::Instant) -> Duration {
        since.elapsed()
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: image decoding.
    pub decode: StageDiagnostics,
    /// Stage 2: single-channel conversion and Gaussian blur.
    pub preprocess: StageDiagnostics,
    /// Stage 3: Canny edge detection.
    pub edge_detection: StageDiagnostics,
    /// Stage 4: morphological closing.
    pub cleaning: StageDiagnostics,
    /// Stage 5: inversion.
    pub invert: StageDiagnostics,
    /// Stages 6-7: re-detection on the inverted map (only when
    /// `config.second_pass == true`).
    pub second_pass: Option<StageDiagnostics>,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
        /// Channel count of the decoded image.
        channels: u8,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
    },
    /// Single-channel conversion and blur metrics.
    Preprocess {
        /// Whether a color-to-gray conversion was needed.
        converted: bool,
        /// Side length of the Gaussian kernel (0 = derived from sigma).
        kernel_size: u32,
        /// Sigma value used for the blur kernel.
        sigma: f32,
    },
    /// Canny edge detection metrics.
    EdgeDetection {
        /// Low threshold (after ordering).
        low_threshold: f32,
        /// High threshold (after ordering).
        high_threshold: f32,
        /// Gradient norm name.
        norm: String,
        /// Number of edge pixels (value == 255) in the output.
        edge_pixel_count: u64,
        /// Total pixel count for computing edge density.
        total_pixel_count: u64,
    },
    /// Morphological closing metrics.
    Cleaning {
        /// Structuring element width.
        element_width: u32,
        /// Structuring element height.
        element_height: u32,
        /// Edge pixels before closing.
        edges_before: u64,
        /// Edge pixels after closing.
        edges_after: u64,
    },
    /// Inversion metrics.
    Invert {
        /// Pixels that are dark (0) after inversion, i.e. the edges.
        dark_pixel_count: u64,
    },
    /// Second-pass metrics.
    SecondPass {
        /// Edge pixels re-detected on the inverted map.
        edge_pixel_count: u64,
        /// Edge pixels after closing the re-detected map.
        cleaned_pixel_count: u64,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Edge pixels in the processed output (dark pixels).
    pub output_edge_pixels: u64,
}

/// Run the pipeline, timing every stage.
///
/// # Errors
///
/// Same as [`crate::process_staged`].
pub fn process_staged_with_diagnostics<C: Clock>(
    image_bytes: &[u8],
    config: &PipelineConfig,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    let total_start = clock.now();

    let start = clock.now();
    let decoded = Pipeline::new(image_bytes.to_vec(), config.clone()).decode()?;
    let decode = timed(clock, &start, &decoded);

    let start = clock.now();
    let preprocessed = decoded.preprocess();
    let preprocess = timed(clock, &start, &preprocessed);

    let start = clock.now();
    let detected = preprocessed.detect_edges();
    let edge_detection = timed(clock, &start, &detected);

    let start = clock.now();
    let cleaned = detected.clean_edges();
    let cleaning = timed(clock, &start, &cleaned);

    let start = clock.now();
    let inverted = cleaned.invert();
    let invert = timed(clock, &start, &inverted);

    let start = clock.now();
    let redetected = inverted.redetect();
    let second_pass = config
        .second_pass
        .then(|| timed(clock, &start, &redetected));

    let staged = redetected.into_result();
    let total_duration = clock.elapsed(&total_start);

    let (image_width, image_height) = (staged.original.width(), staged.original.height());
    let summary = PipelineSummary {
        image_width,
        image_height,
        pixel_count: u64::from(image_width) * u64::from(image_height),
        output_edge_pixels: count_pixels(&staged.inverted, 0),
    };

    let diagnostics = PipelineDiagnostics {
        decode,
        preprocess,
        edge_detection,
        cleaning,
        invert,
        second_pass,
        total_duration,
        summary,
    };
    log::debug!("pipeline finished in {:.3}ms", duration_ms(total_duration));
    Ok((staged, diagnostics))
}

/// Stamp a just-finished stage with its duration and metrics.
fn timed<C: Clock, S: PipelineStage>(clock: &C, start: &C::Instant, stage: &S) -> StageDiagnostics {
    let duration = clock.elapsed(start);
    StageDiagnostics {
        duration,
        metrics: stage.metrics(),
    }
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let mut stages = vec![
            ("Decode", &self.decode),
            ("Preprocess", &self.preprocess),
            ("Edge Detection", &self.edge_detection),
            ("Cleaning", &self.cleaning),
            ("Invert", &self.invert),
        ];
        if let Some(ref second) = self.second_pass {
            stages.push(("Second Pass", second));
        }

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Output edge pixels: {}",
            self.summary.output_edge_pixels,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
            channels,
            ..
        } => {
            format!("{input_bytes} bytes -> {width}x{height}x{channels}")
        }
        StageMetrics::Preprocess {
            converted,
            kernel_size,
            sigma,
        } => {
            let conversion = if *converted { "converted, " } else { "" };
            format!("{conversion}kernel={kernel_size} sigma={sigma:.2}")
        }
        StageMetrics::EdgeDetection {
            low_threshold,
            high_threshold,
            norm,
            edge_pixel_count,
            total_pixel_count,
        } => {
            format!(
                "low={low_threshold:.1} high={high_threshold:.1} {norm} edges={edge_pixel_count} ({:.1}%)",
                density(*edge_pixel_count, *total_pixel_count),
            )
        }
        StageMetrics::Cleaning {
            element_width,
            element_height,
            edges_before,
            edges_after,
        } => {
            format!("{element_width}x{element_height} edges={edges_before}->{edges_after}")
        }
        StageMetrics::Invert { dark_pixel_count } => format!("dark={dark_pixel_count}"),
        StageMetrics::SecondPass {
            edge_pixel_count,
            cleaned_pixel_count,
        } => format!("edges={edge_pixel_count} cleaned={cleaned_pixel_count}"),
    }
}

#[allow(clippy::cast_precision_loss)]
fn density(count: u64, total: u64) -> f64 {
    if total > 0 {
        count as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// Count pixels equal to `value` in a grayscale image.
pub(crate) fn count_pixels(image: &image::GrayImage, value: u8) -> u64 {
    image
        .pixels()
        .map(|p| u64::from(u8::from(p.0[0] == value)))
        .sum()
}

//! edgecraft: run the edge-detection pipeline on an image and present the
//! original next to the processed edge map.
//!
//! With `--output` the two panels are written as one PNG. Without it a
//! short summary is printed instead. `--report` and `--json` add per-stage
//! diagnostics.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin edgecraft -- [OPTIONS] [IMAGE_PATH]
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

#[cfg(feature = "dialog")]
mod dialog;

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use edgecraft_io::{
    ComparisonPresenter, PipelineRunner, PresentError, Presenter, ProcessError, SelectionOutcome,
};
use edgecraft_pipeline::diagnostics::{PipelineDiagnostics, SystemClock};
use edgecraft_pipeline::{DynamicImage, GrayImage, LoadMode, PipelineConfig, ProcessResult};
use log::{debug, info};

/// Classical edge detection with a side-by-side comparison.
///
/// Loads an image, blurs it, runs Canny, closes small gaps, and inverts
/// the edge map so edges are dark on white.
#[derive(Parser)]
#[command(name = "edgecraft", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP). When omitted and the
    /// `dialog` feature is enabled, a file picker is opened.
    image_path: Option<PathBuf>,

    /// Write the side-by-side comparison PNG to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Starting threshold preset.
    ///
    /// Defaults to `interactive` (Canny 48/53), also when an image path is
    /// given. Pass `--preset default` for the 50/50 pair of the direct
    /// pipeline entry point.
    #[arg(long, value_enum, default_value_t = Preset::Interactive)]
    preset: Preset,

    /// Pipeline config as a JSON file. Replaces the preset.
    #[arg(long, conflicts_with = "config_json")]
    config: Option<PathBuf>,

    /// Pipeline config as a JSON string. Replaces the preset.
    ///
    /// Fields that are absent take their default values.
    #[arg(long)]
    config_json: Option<String>,

    /// Canny low threshold.
    #[arg(long)]
    low: Option<f32>,

    /// Canny high threshold.
    #[arg(long)]
    high: Option<f32>,

    /// How the image is decoded.
    #[arg(long, value_enum)]
    load_mode: Option<Mode>,

    /// Skip the second Canny and closing pass on the inverted map.
    #[arg(long)]
    no_second_pass: bool,

    /// Print a human-readable per-stage report.
    #[arg(long, conflicts_with = "json")]
    report: bool,

    /// Print per-stage diagnostics as JSON.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Threshold preset selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// Canny thresholds 50/50.
    Default,
    /// Canny thresholds 48/53.
    Interactive,
}

/// Decode mode selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Decode straight to one 8-bit channel.
    Grayscale,
    /// Decode in the file's own color layout.
    Color,
}

impl From<Mode> for LoadMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Grayscale => Self::Grayscale,
            Mode::Color => Self::Color,
        }
    }
}

/// Map `-v` occurrences to a log level name.
const fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// The preset is the base. `--config` or `--config-json` replaces it, then
/// individual flags override single fields.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    let mut config = if let Some(ref path) = cli.config {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Error reading --config {}: {e}", path.display()))?;
        serde_json::from_str(&json)
            .map_err(|e| format!("Error parsing --config {}: {e}", path.display()))?
    } else if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        match cli.preset {
            Preset::Default => PipelineConfig::default(),
            Preset::Interactive => PipelineConfig::interactive(),
        }
    };

    if let Some(low) = cli.low {
        config.canny_low = low;
    }
    if let Some(high) = cli.high {
        config.canny_high = high;
    }
    if let Some(mode) = cli.load_mode {
        config.load_mode = mode.into();
    }
    if cli.no_second_pass {
        config.second_pass = false;
    }

    config.validate().map_err(|e| format!("Error: {e}"))?;
    Ok(config)
}

/// [`PipelineRunner`] that also records per-stage diagnostics.
struct DiagnosticRunner {
    config: PipelineConfig,
    diagnostics: RefCell<Option<PipelineDiagnostics>>,
}

impl DiagnosticRunner {
    const fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            diagnostics: RefCell::new(None),
        }
    }

    fn into_diagnostics(self) -> Option<PipelineDiagnostics> {
        self.diagnostics.into_inner()
    }
}

impl PipelineRunner for DiagnosticRunner {
    fn run(&self, path: &Path) -> Result<ProcessResult, ProcessError> {
        let bytes = edgecraft_io::read_image_bytes(path)?;
        let (staged, diagnostics) = edgecraft_pipeline::diagnostics::process_staged_with_diagnostics(
            &bytes,
            &self.config,
            &SystemClock,
        )
        .map_err(|e| ProcessError::from_pipeline(path, e))?;
        self.diagnostics.replace(Some(diagnostics));
        Ok(staged.into())
    }
}

/// [`Presenter`] used when no output file is requested: prints a summary.
struct SummaryPresenter;

impl Presenter for SummaryPresenter {
    fn present(
        &mut self,
        original: &DynamicImage,
        processed: &GrayImage,
    ) -> Result<(), PresentError> {
        let edge_pixels = processed.pixels().filter(|p| p.0[0] == 0).count();
        println!(
            "{}: {}x{}",
            edgecraft_io::present::ORIGINAL_TITLE,
            original.width(),
            original.height(),
        );
        println!(
            "{}: {}x{}, {edge_pixels} edge pixels",
            edgecraft_io::present::PROCESSED_TITLE,
            processed.width(),
            processed.height(),
        );
        Ok(())
    }
}

/// The image to process: the CLI argument, or the file picker when enabled.
fn selection(cli: &Cli) -> Result<Option<PathBuf>, String> {
    if let Some(ref path) = cli.image_path {
        return Ok(Some(path.clone()));
    }

    #[cfg(feature = "dialog")]
    {
        Ok(dialog::pick_image())
    }

    #[cfg(not(feature = "dialog"))]
    {
        Err("No image path given (build with the `dialog` feature to pick one)".to_owned())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level(cli.verbose)),
    )
    .init();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    debug!("config: {config:?}");

    let path = match selection(&cli) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let runner = DiagnosticRunner::new(config);
    let mut file_presenter = cli.output.as_ref().map(ComparisonPresenter::new);
    let mut summary = SummaryPresenter;
    let presenter: &mut dyn Presenter = match file_presenter {
        Some(ref mut p) => p,
        None => &mut summary,
    };

    match edgecraft_io::handle_selection(path.as_deref(), &runner, presenter) {
        Ok(SelectionOutcome::Cancelled) => {
            eprintln!("No image selected");
            return ExitCode::SUCCESS;
        }
        Ok(SelectionOutcome::Presented) => {}
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    }

    if let Some(ref output) = cli.output {
        info!("comparison written to {}", output.display());
    }

    if let Some(diagnostics) = runner.into_diagnostics() {
        if cli.json {
            match serde_json::to_string_pretty(&diagnostics) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing diagnostics: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else if cli.report {
            println!("{}", diagnostics.report());
        }
    }

    ExitCode::SUCCESS
}

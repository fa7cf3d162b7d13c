//! Filesystem loading and the path-based pipeline entry point.

use std::path::{Path, PathBuf};

use edgecraft_pipeline::{DynamicImage, LoadMode, PipelineConfig, PipelineError, ProcessResult};
use log::{debug, info};

/// The one runtime failure of the pipeline: the image could not be
/// loaded. Configuration errors are reported separately.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The file could not be read.
    #[error("could not load image from {}: {source}", path.display())]
    NotFound {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying read error.
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not a decodable image.
    #[error("could not decode image from {}: {source}", path.display())]
    Undecodable {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying decode error.
        #[source]
        source: PipelineError,
    },

    /// The pipeline configuration was rejected before loading.
    #[error(transparent)]
    Config(PipelineError),
}

impl ProcessError {
    /// Attribute a pipeline error to the file it was raised for.
    #[must_use]
    pub fn from_pipeline(path: &Path, err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidConfig(_) => Self::Config(err),
            PipelineError::EmptyInput | PipelineError::ImageDecode(_) => Self::Undecodable {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// Read the raw bytes of an image file.
///
/// # Errors
///
/// Returns [`ProcessError::NotFound`] if the file cannot be read.
pub fn read_image_bytes(path: &Path) -> Result<Vec<u8>, ProcessError> {
    let bytes = std::fs::read(path).map_err(|source| ProcessError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// Load an image from `path`.
///
/// # Errors
///
/// Returns [`ProcessError::NotFound`] if the file cannot be read and
/// [`ProcessError::Undecodable`] if it is empty or not an image.
pub fn load(path: &Path, mode: LoadMode) -> Result<DynamicImage, ProcessError> {
    let bytes = read_image_bytes(path)?;
    edgecraft_pipeline::grayscale::decode(&bytes, mode)
        .map_err(|err| ProcessError::from_pipeline(path, err))
}

/// Load `path` and run the full pipeline on it.
///
/// The config is validated before the file is touched. A load failure
/// propagates immediately; no later stage runs.
///
/// # Errors
///
/// Returns [`ProcessError::Config`] for an invalid config, otherwise the
/// errors of [`load`].
pub fn process(path: &Path, config: &PipelineConfig) -> Result<ProcessResult, ProcessError> {
    config.validate().map_err(ProcessError::Config)?;
    let bytes = read_image_bytes(path)?;
    let result = edgecraft_pipeline::process_bytes(&bytes, config)
        .map_err(|err| ProcessError::from_pipeline(path, err))?;
    info!(
        "processed {} ({}x{}, thresholds {}/{})",
        path.display(),
        result.processed.width(),
        result.processed.height(),
        config.canny_low,
        config.canny_high,
    );
    Ok(result)
}

//! The pipeline capability behind the image-selection handler.

use std::path::Path;

use edgecraft_pipeline::{PipelineConfig, ProcessResult};

use crate::loader::ProcessError;

/// Something that can turn an image path into an (original, processed)
/// pair.
pub trait PipelineRunner {
    /// Run the pipeline on the image at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] when the image cannot be loaded or the
    /// runner's config is invalid.
    fn run(&self, path: &Path) -> Result<ProcessResult, ProcessError>;
}

/// [`PipelineRunner`] that reads from the filesystem with a fixed config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilePipeline {
    config: PipelineConfig,
}

impl FilePipeline {
    /// Runner with an explicit config.
    #[must_use]
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Runner with the thresholds used for interactively picked images.
    #[must_use]
    pub fn interactive() -> Self {
        Self::new(PipelineConfig::interactive())
    }

    /// The config every run uses.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

impl PipelineRunner for FilePipeline {
    fn run(&self, path: &Path) -> Result<ProcessResult, ProcessError> {
        crate::loader::process(path, &self.config)
    }
}

//! edgecraft-io: filesystem loading and presentation.
//!
//! Reads images from disk, runs them through `edgecraft-pipeline`, and
//! presents the original next to the processed edge map. The selection
//! handler ties a [`PipelineRunner`] to a [`Presenter`] the way a
//! "Load Image" button would.

pub mod loader;
pub mod present;
pub mod runner;
pub mod selection;

pub use loader::{ProcessError, load, process, read_image_bytes};
pub use present::{ComparisonPresenter, PresentError, Presenter, side_by_side};
pub use runner::{FilePipeline, PipelineRunner};
pub use selection::{
    HandlerError, LOAD_BUTTON, PROMPT, SelectionOutcome, WINDOW_TITLE, handle_selection,
};

//! The "Load Image" action: run the pipeline on a chosen file and show
//! the result.

use std::path::Path;

use log::info;

use crate::loader::ProcessError;
use crate::present::{PresentError, Presenter};
use crate::runner::PipelineRunner;

/// Title of the viewer window.
pub const WINDOW_TITLE: &str = "Image Edge Detection";

/// Prompt shown by the file picker.
pub const PROMPT: &str = "Select an image to process and display";

/// Label of the action that opens the file picker.
pub const LOAD_BUTTON: &str = "Load Image";

/// What a selection led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// No file was chosen; nothing ran.
    Cancelled,
    /// The pipeline ran and the comparison was presented.
    Presented,
}

/// Failure of either half of the selection handler.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The pipeline could not process the selected file.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// The processed pair could not be presented.
    #[error(transparent)]
    Present(#[from] PresentError),
}

/// Handle the result of a file-picker interaction.
///
/// `None` means the picker was dismissed and returns
/// [`SelectionOutcome::Cancelled`] without touching the runner or the
/// presenter. Otherwise the runner processes the file and its output is
/// handed to the presenter.
///
/// # Errors
///
/// Returns [`HandlerError::Process`] if the pipeline fails, in which case
/// nothing is presented, and [`HandlerError::Present`] if presenting fails.
pub fn handle_selection<R, P>(
    selection: Option<&Path>,
    runner: &R,
    presenter: &mut P,
) -> Result<SelectionOutcome, HandlerError>
where
    R: PipelineRunner + ?Sized,
    P: Presenter + ?Sized,
{
    let Some(path) = selection else {
        info!("selection cancelled");
        return Ok(SelectionOutcome::Cancelled);
    };

    let result = runner.run(path)?;
    presenter.present(&result.original, &result.processed)?;
    Ok(SelectionOutcome::Presented)
}

//! Native file-open dialog.

use std::path::PathBuf;

use log::info;

/// Extensions the pipeline can decode.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp"];

/// Ask the user for an image. `None` when the dialog is dismissed.
pub fn pick_image() -> Option<PathBuf> {
    info!(
        "{}: {} ({})",
        edgecraft_io::WINDOW_TITLE,
        edgecraft_io::LOAD_BUTTON,
        edgecraft_io::PROMPT,
    );
    rfd::FileDialog::new()
        .set_title(edgecraft_io::PROMPT)
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
}

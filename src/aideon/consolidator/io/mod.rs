pub mod decode;
pub mod excel_write;

use std::fs;
use std::path::Path;

use crate::aideon::consolidator::error::{ConsolidateError, Result};
use crate::aideon::consolidator::model::InputFile;

/// Reads a file from disk into an [`InputFile`] named after its file name.
pub fn load_input(path: &Path) -> Result<InputFile> {
    if !path.is_file() {
        return Err(ConsolidateError::MissingInput(path.to_path_buf()));
    }
    let bytes = fs::read(path)?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(InputFile::new(name, bytes))
}

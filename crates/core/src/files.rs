//! Input selection and output naming
//!
//! Decides which directory entries are processed and where their outlines
//! are written. Only [`list_pdf_files`] touches the filesystem.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

const PDF_SUFFIX: &str = ".pdf";
const JSON_SUFFIX: &str = ".json";

/// Error type for directory scanning
#[derive(Debug, Error)]
pub enum FilesError {
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether a file name carries the (case-sensitive) `.pdf` suffix.
pub fn is_pdf_file_name(name: &str) -> bool {
    has_pdf_suffix(OsStr::new(name))
}

fn has_pdf_suffix(name: &OsStr) -> bool {
    name.as_encoded_bytes().ends_with(PDF_SUFFIX.as_bytes())
}

/// Map `name.pdf` to `name.json`.
///
/// Only the trailing suffix is replaced; names without it get `.json`
/// appended.
pub fn output_file_name(name: &str) -> String {
    let stem = name.strip_suffix(PDF_SUFFIX).unwrap_or(name);
    format!("{}{}", stem, JSON_SUFFIX)
}

/// [`output_file_name`] for names that may not be valid UTF-8.
///
/// Non-UTF-8 names keep their bytes and get their last extension swapped for
/// `json`.
pub fn output_os_file_name(name: &OsStr) -> OsString {
    match name.to_str() {
        Some(name) => output_file_name(name).into(),
        None => Path::new(name).with_extension("json").into_os_string(),
    }
}

/// List the PDF files directly inside `dir`, sorted by file name.
///
/// Subdirectories are skipped. The suffix is matched on the raw name, so
/// names that are not valid UTF-8 still qualify.
pub fn list_pdf_files(dir: &Path) -> Result<Vec<PathBuf>, FilesError> {
    if !dir.is_dir() {
        return Err(FilesError::NotADirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        if path.file_name().is_some_and(has_pdf_suffix) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{failed} of {total} files failed")]
    FilesFailed { failed: usize, total: usize },

    #[error("Input directory not found: {0}")]
    InputDirMissing(std::path::PathBuf),
}

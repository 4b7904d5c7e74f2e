use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("unsupported archive format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("entry '{entry}' escapes the extraction root '{root}'")]
    PathTraversal { entry: String, root: PathBuf },

    #[error("entry not found in archive: {entry}")]
    EntryNotFound { entry: String },

    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("operation cancelled")]
    Cancelled,

    #[error("worker thread panicked")]
    WorkerPanicked,

    #[error("archive is corrupted: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

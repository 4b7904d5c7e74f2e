//! Otapack core - streaming archive engine
//!
//! This crate implements the archive side of otapack: creating ZIP and
//! TAR(+gzip/bzip2) archives from a file set, extracting and listing
//! archives (including archives nested inside other archives), and the
//! progress/cancellation plumbing that a UI or CLI subscribes to.
//!
//! Every operation streams through its source in fixed-size chunks and
//! emits progress snapshots in strictly non-decreasing order; nothing here
//! holds shared mutable state, so unrelated operations never interfere.

pub mod create;
pub mod entry;
pub mod error;
pub mod extract;
pub mod format;
pub mod nested;
pub mod progress;
pub mod session;

mod sanitize;

pub use create::create_archive;
pub use entry::ArchiveEntry;
pub use error::{ArchiveError, Result};
pub use extract::{extract_archive, is_archive_file, list_archive_contents};
pub use format::{ArchiveFormat, CompressionLevel};
pub use nested::list_nested_archive_contents;
pub use progress::{
    ArchiveCreationProgress, CancelToken, ExtractionProgress, ExtractionState,
};
pub use session::{CreateSession, ExtractSession};

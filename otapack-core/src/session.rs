//! Background operation sessions.
//!
//! A session runs one archive operation on a dedicated worker thread and
//! exposes its snapshots as a channel the subscriber drains at its own
//! pace. Sessions hold no shared state besides the cancellation flag, so
//! concurrent sessions on distinct outputs never interfere.

use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crate::create::create_archive;
use crate::error::{ArchiveError, Result};
use crate::extract::extract_archive;
use crate::format::CompressionLevel;
use crate::progress::{ArchiveCreationProgress, CancelToken, ExtractionProgress};

/// A running extraction. Drop the receiver to detach; call
/// [`ExtractSession::cancel`] to stop the worker and clean up the
/// partially-written file.
pub struct ExtractSession {
    receiver: flume::Receiver<ExtractionProgress>,
    cancel: CancelToken,
    handle: JoinHandle<Result<()>>,
}

impl ExtractSession {
    pub fn spawn(archive_path: PathBuf, output_dir: PathBuf) -> Self {
        let cancel = CancelToken::new();
        let (tx, rx) = flume::unbounded();
        let worker_cancel = cancel.clone();
        let handle = thread::spawn(move || {
            extract_archive(&archive_path, &output_dir, &worker_cancel, move |snapshot| {
                // A detached subscriber is not an error; the token is the
                // only stop signal.
                let _ = tx.send(snapshot);
            })
        });
        ExtractSession {
            receiver: rx,
            cancel,
            handle,
        }
    }

    /// The snapshot sequence. Iterating until disconnect yields the
    /// terminal `Completed` or `Error` snapshot last.
    pub fn progress(&self) -> &flume::Receiver<ExtractionProgress> {
        &self.receiver
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Join the worker and return its terminal result.
    pub fn wait(self) -> Result<()> {
        self.handle.join().map_err(|_| ArchiveError::WorkerPanicked)?
    }
}

/// A running archive creation; same contract as [`ExtractSession`].
pub struct CreateSession {
    receiver: flume::Receiver<ArchiveCreationProgress>,
    cancel: CancelToken,
    handle: JoinHandle<Result<()>>,
}

impl CreateSession {
    pub fn spawn(
        output_path: PathBuf,
        files: Vec<PathBuf>,
        base_path: PathBuf,
        level: CompressionLevel,
    ) -> Self {
        let cancel = CancelToken::new();
        let (tx, rx) = flume::unbounded();
        let worker_cancel = cancel.clone();
        let handle = thread::spawn(move || {
            create_archive(
                &output_path,
                &files,
                &base_path,
                level,
                &worker_cancel,
                move |snapshot| {
                    let _ = tx.send(snapshot);
                },
            )
        });
        CreateSession {
            receiver: rx,
            cancel,
            handle,
        }
    }

    pub fn progress(&self) -> &flume::Receiver<ArchiveCreationProgress> {
        &self.receiver
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn wait(self) -> Result<()> {
        self.handle.join().map_err(|_| ArchiveError::WorkerPanicked)?
    }
}

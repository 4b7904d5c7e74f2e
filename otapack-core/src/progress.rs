//! Progress snapshots, cancellation, and the counting reader shared by the
//! create and extract paths.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Chunk size for all streaming copies.
pub(crate) const COPY_CHUNK: usize = 64 * 1024;

/// Emit an intermediate snapshot roughly every this many bytes written.
pub(crate) const PROGRESS_BYTE_INTERVAL: u64 = 1024 * 1024;

/// Extraction lifecycle. `Error` is terminal; `Extracting` repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionState {
    Idle,
    Started,
    Extracting,
    Completed,
    Error,
}

/// Point-in-time extraction snapshot. Consumers must treat it as
/// transient; a later snapshot supersedes it entirely.
#[derive(Debug, Clone)]
pub struct ExtractionProgress {
    /// 0-100; capped at 99 until the terminal `Completed` snapshot because
    /// the percentage is derived from archive-byte consumption, which is an
    /// approximation of real progress when compression ratios vary.
    pub percentage: u8,
    pub current_file: String,
    pub state: ExtractionState,
    pub error: Option<String>,
}

impl ExtractionProgress {
    pub(crate) fn started() -> Self {
        ExtractionProgress {
            percentage: 0,
            current_file: String::new(),
            state: ExtractionState::Started,
            error: None,
        }
    }

    pub(crate) fn extracting(percentage: u8, current_file: impl Into<String>) -> Self {
        ExtractionProgress {
            percentage,
            current_file: current_file.into(),
            state: ExtractionState::Extracting,
            error: None,
        }
    }

    pub(crate) fn completed() -> Self {
        ExtractionProgress {
            percentage: 100,
            current_file: String::new(),
            state: ExtractionState::Completed,
            error: None,
        }
    }

    pub(crate) fn error(message: impl Into<String>) -> Self {
        ExtractionProgress {
            percentage: 0,
            current_file: String::new(),
            state: ExtractionState::Error,
            error: Some(message.into()),
        }
    }
}

/// Point-in-time creation snapshot. Same transient contract as
/// [`ExtractionProgress`].
#[derive(Debug, Clone, Default)]
pub struct ArchiveCreationProgress {
    pub current_file: String,
    pub percentage: u8,
    pub files_processed: u64,
    pub total_files: u64,
    pub bytes_processed: u64,
    pub total_bytes: u64,
}

/// Cooperative cancellation flag shared between a session owner and its
/// worker. Cancellation is observed at chunk granularity.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Shared byte counter handed to readers that sit below a decoder, so the
/// operation can observe raw archive-byte consumption.
#[derive(Debug, Clone, Default)]
pub(crate) struct ByteCounter(Arc<std::sync::atomic::AtomicU64>);

impl ByteCounter {
    pub(crate) fn new() -> Self {
        ByteCounter::default()
    }

    pub(crate) fn get(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::SeqCst);
    }
}

/// Reader wrapper that feeds [`ByteCounter`] with every byte it passes
/// through. Sits directly on the archive file, below any decoder.
pub(crate) struct CountingReader<R> {
    inner: R,
    counter: ByteCounter,
}

impl<R: Read> CountingReader<R> {
    pub(crate) fn new(inner: R, counter: ByteCounter) -> Self {
        CountingReader { inner, counter }
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.counter.add(n as u64);
        Ok(n)
    }
}

/// Reader wrapper that fires a callback roughly every
/// [`PROGRESS_BYTE_INTERVAL`] bytes and fails the stream once the token is
/// cancelled. The callback receives the total bytes read from the wrapped
/// reader so far.
pub(crate) struct ProgressReader<'a, R, F: FnMut(u64)> {
    inner: R,
    cancel: &'a CancelToken,
    bytes_read: u64,
    last_reported: u64,
    on_interval: F,
}

impl<'a, R: Read, F: FnMut(u64)> ProgressReader<'a, R, F> {
    pub(crate) fn new(inner: R, cancel: &'a CancelToken, on_interval: F) -> Self {
        ProgressReader {
            inner,
            cancel,
            bytes_read: 0,
            last_reported: 0,
            on_interval,
        }
    }
}

impl<'a, R: Read, F: FnMut(u64)> Read for ProgressReader<'a, R, F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.cancel.is_cancelled() {
            return Err(io::Error::new(io::ErrorKind::Other, "operation cancelled"));
        }
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        if self.bytes_read - self.last_reported >= PROGRESS_BYTE_INTERVAL {
            self.last_reported = self.bytes_read;
            (self.on_interval)(self.bytes_read);
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_counting_reader_counts_raw_bytes() {
        let data = vec![7u8; 3000];
        let counter = ByteCounter::new();
        let mut reader = CountingReader::new(Cursor::new(data), counter.clone());
        let mut sink = Vec::new();
        std::io::copy(&mut reader, &mut sink).unwrap();
        assert_eq!(counter.get(), 3000);
    }

    #[test]
    fn test_progress_reader_interval_cadence() {
        let data = vec![0u8; 3 * PROGRESS_BYTE_INTERVAL as usize + 17];
        let cancel = CancelToken::new();
        let mut ticks = Vec::new();
        let mut reader = ProgressReader::new(Cursor::new(data), &cancel, |n| ticks.push(n));
        let mut buf = vec![0u8; COPY_CHUNK];
        while reader.read(&mut buf).unwrap() > 0 {}
        assert_eq!(ticks.len(), 3);
        assert!(ticks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_progress_reader_stops_when_cancelled() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut reader = ProgressReader::new(Cursor::new(vec![0u8; 64]), &cancel, |_| {});
        let mut buf = [0u8; 16];
        assert!(reader.read(&mut buf).is_err());
    }
}

//! Streaming archive extraction and listing.
//!
//! The reader is chosen from the archive's file extension. Extraction
//! walks entries in on-disk order, streams each file in fixed chunks, and
//! reports progress as a percentage of archive-file bytes consumed, capped
//! at 99 until the terminal snapshot.

use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, Write};
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;

use crate::entry::ArchiveEntry;
use crate::error::{ArchiveError, Result};
use crate::progress::{
    ByteCounter, CancelToken, CountingReader, ExtractionProgress, ProgressReader, COPY_CHUNK,
};
use crate::sanitize::resolve_entry_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReaderKind {
    Zip,
    Tar(TarCodec),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TarCodec {
    Plain,
    Gzip,
    Bzip2,
}

/// Decoder selected by [`TarCodec`]; keeps the concrete reader type so the
/// tar stream can be built without boxing.
pub(crate) enum TarDecoder<R: Read> {
    Plain(BufReader<R>),
    Gzip(GzDecoder<BufReader<R>>),
    Bzip2(BzDecoder<BufReader<R>>),
}

impl TarCodec {
    pub(crate) fn decoder<R: Read>(self, reader: R) -> TarDecoder<R> {
        let reader = BufReader::new(reader);
        match self {
            TarCodec::Plain => TarDecoder::Plain(reader),
            TarCodec::Gzip => TarDecoder::Gzip(GzDecoder::new(reader)),
            TarCodec::Bzip2 => TarDecoder::Bzip2(BzDecoder::new(reader)),
        }
    }
}

impl<R: Read> Read for TarDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            TarDecoder::Plain(r) => r.read(buf),
            TarDecoder::Gzip(r) => r.read(buf),
            TarDecoder::Bzip2(r) => r.read(buf),
        }
    }
}

/// Pick the reader for an archive path by extension.
///
/// Unrecognized extensions are an explicit error rather than an empty
/// entry walk, so a misnamed or unsupported archive cannot masquerade as
/// an empty one.
pub(crate) fn reader_for(path: &Path) -> Result<ReaderKind> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if name.ends_with(".zip") {
        Ok(ReaderKind::Zip)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") || name.ends_with(".gz") {
        Ok(ReaderKind::Tar(TarCodec::Gzip))
    } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") || name.ends_with(".bz2") {
        Ok(ReaderKind::Tar(TarCodec::Bzip2))
    } else if name.ends_with(".tar") {
        Ok(ReaderKind::Tar(TarCodec::Plain))
    } else {
        Err(ArchiveError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
    }
}

/// Extension-only archive classification.
///
/// No content sniffing: a corrupt `.zip` still classifies as an archive,
/// and `.7z`/`.rar` classify as archives even though reading them is
/// unsupported.
pub fn is_archive_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .as_deref(),
        Some("zip" | "tar" | "gz" | "tgz" | "bz2" | "tbz2" | "7z" | "rar")
    )
}

/// Extract `archive_path` into `output_dir`, streaming progress snapshots
/// through `on_progress`.
///
/// Emits `Started`, one `Extracting` snapshot before each file plus one
/// roughly every MiB written, then exactly one terminal snapshot:
/// `Completed` at 100%, or `Error` carrying the failure message. The
/// in-flight destination file is removed on failure or cancellation.
pub fn extract_archive(
    archive_path: &Path,
    output_dir: &Path,
    cancel: &CancelToken,
    mut on_progress: impl FnMut(ExtractionProgress),
) -> Result<()> {
    on_progress(ExtractionProgress::started());
    let result = run_extract(archive_path, output_dir, cancel, &mut on_progress).map_err(|e| {
        if cancel.is_cancelled() {
            ArchiveError::Cancelled
        } else {
            e
        }
    });
    match result {
        Ok(()) => {
            on_progress(ExtractionProgress::completed());
            Ok(())
        }
        Err(e) => {
            on_progress(ExtractionProgress::error(e.to_string()));
            Err(e)
        }
    }
}

fn run_extract(
    archive_path: &Path,
    output_dir: &Path,
    cancel: &CancelToken,
    on_progress: &mut dyn FnMut(ExtractionProgress),
) -> Result<()> {
    let kind = reader_for(archive_path)?;
    fs::create_dir_all(output_dir)?;
    let archive_size = fs::metadata(archive_path)?.len().max(1);
    match kind {
        ReaderKind::Zip => extract_zip(archive_path, output_dir, archive_size, cancel, on_progress),
        ReaderKind::Tar(codec) => {
            extract_tar(archive_path, codec, output_dir, archive_size, cancel, on_progress)
        }
    }
}

fn extract_zip(
    archive_path: &Path,
    output_dir: &Path,
    archive_size: u64,
    cancel: &CancelToken,
    on_progress: &mut dyn FnMut(ExtractionProgress),
) -> Result<()> {
    let mut zip = zip::ZipArchive::new(BufReader::new(File::open(archive_path)?))?;
    // Compressed bytes of fully-processed entries; the in-flight entry is
    // accounted by scaling written bytes against its compression ratio.
    let mut consumed: u64 = 0;

    for i in 0..zip.len() {
        if cancel.is_cancelled() {
            return Err(ArchiveError::Cancelled);
        }
        let entry = zip.by_index(i)?;
        let name = entry.name().to_string();
        let resolved = resolve_entry_path(&name, output_dir)?;

        if entry.is_dir() {
            fs::create_dir_all(&resolved)?;
            continue;
        }
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)?;
        }

        let compressed = entry.compressed_size();
        let uncompressed = entry.size().max(1);
        on_progress(ExtractionProgress::extracting(
            clamp99(consumed, archive_size),
            &name,
        ));

        let mut reader = ProgressReader::new(entry, cancel, |written| {
            let scaled =
                (compressed as u128 * written as u128 / uncompressed as u128) as u64;
            on_progress(ExtractionProgress::extracting(
                clamp99(consumed + scaled.min(compressed), archive_size),
                &name,
            ));
        });
        write_file(&resolved, &mut reader)?;
        consumed += compressed;
    }
    Ok(())
}

fn extract_tar(
    archive_path: &Path,
    codec: TarCodec,
    output_dir: &Path,
    archive_size: u64,
    cancel: &CancelToken,
    on_progress: &mut dyn FnMut(ExtractionProgress),
) -> Result<()> {
    let counter = ByteCounter::new();
    let source = CountingReader::new(File::open(archive_path)?, counter.clone());
    let mut archive = tar::Archive::new(codec.decoder(source));

    for entry in archive.entries()? {
        if cancel.is_cancelled() {
            return Err(ArchiveError::Cancelled);
        }
        let entry = entry?;
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let resolved = resolve_entry_path(&name, output_dir)?;
        let entry_type = entry.header().entry_type();

        if entry_type.is_dir() {
            fs::create_dir_all(&resolved)?;
            continue;
        }
        if !entry_type.is_file() {
            log::debug!("skip_entry name={} type={:?}", name, entry_type);
            continue;
        }
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)?;
        }

        on_progress(ExtractionProgress::extracting(
            clamp99(counter.get(), archive_size),
            &name,
        ));

        let tick_counter = counter.clone();
        let mut reader = ProgressReader::new(entry, cancel, |_| {
            on_progress(ExtractionProgress::extracting(
                clamp99(tick_counter.get(), archive_size),
                &name,
            ));
        });
        write_file(&resolved, &mut reader)?;
    }
    Ok(())
}

/// Stream a single entry to disk in fixed-size chunks, removing the
/// partial file on failure.
fn write_file(dest: &Path, reader: &mut impl Read) -> Result<()> {
    let mut out = File::create(dest)?;
    let mut buf = vec![0u8; COPY_CHUNK];
    let result = loop {
        match reader.read(&mut buf) {
            Ok(0) => break Ok(()),
            Ok(n) => {
                if let Err(e) = out.write_all(&buf[..n]) {
                    break Err(e);
                }
            }
            Err(e) => break Err(e),
        }
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            drop(out);
            let _ = fs::remove_file(dest);
            Err(e.into())
        }
    }
}

fn clamp99(processed: u64, archive_size: u64) -> u8 {
    ((processed.saturating_mul(100) / archive_size) as u8).min(99)
}

/// Enumerate an archive without extracting, in on-disk order.
pub fn list_archive_contents(archive_path: &Path) -> Result<Vec<ArchiveEntry>> {
    match reader_for(archive_path)? {
        ReaderKind::Zip => list_zip(File::open(archive_path)?),
        ReaderKind::Tar(codec) => list_tar(File::open(archive_path)?, codec),
    }
}

pub(crate) fn list_zip<R: Read + Seek>(reader: R) -> Result<Vec<ArchiveEntry>> {
    let mut zip = zip::ZipArchive::new(reader)?;
    let mut entries = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let file = zip.by_index(i)?;
        entries.push(ArchiveEntry::new(file.name(), file.size(), file.is_dir()));
    }
    Ok(entries)
}

pub(crate) fn list_tar<R: Read>(reader: R, codec: TarCodec) -> Result<Vec<ArchiveEntry>> {
    let mut archive = tar::Archive::new(codec.decoder(reader));
    let mut entries = Vec::new();
    for entry in archive.entries()? {
        let entry = entry?;
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let header = entry.header();
        entries.push(ArchiveEntry::new(
            name,
            header.size().unwrap_or(0),
            header.entry_type().is_dir(),
        ));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_for_known_extensions() {
        assert_eq!(reader_for(Path::new("a.zip")).unwrap(), ReaderKind::Zip);
        assert_eq!(
            reader_for(Path::new("a.tar")).unwrap(),
            ReaderKind::Tar(TarCodec::Plain)
        );
        assert_eq!(
            reader_for(Path::new("a.tar.gz")).unwrap(),
            ReaderKind::Tar(TarCodec::Gzip)
        );
        assert_eq!(
            reader_for(Path::new("a.tgz")).unwrap(),
            ReaderKind::Tar(TarCodec::Gzip)
        );
        assert_eq!(
            reader_for(Path::new("a.tar.bz2")).unwrap(),
            ReaderKind::Tar(TarCodec::Bzip2)
        );
    }

    #[test]
    fn test_reader_for_unknown_extension_is_explicit_error() {
        let err = reader_for(Path::new("a.7z")).unwrap_err();
        assert!(matches!(err, ArchiveError::UnsupportedFormat { .. }));
        let err = reader_for(Path::new("a.rar")).unwrap_err();
        assert!(matches!(err, ArchiveError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_is_archive_file_by_extension_only() {
        assert!(is_archive_file(Path::new("a.zip")));
        assert!(is_archive_file(Path::new("a.tgz")));
        // Classified yes even though reading them is unsupported
        assert!(is_archive_file(Path::new("a.7z")));
        assert!(is_archive_file(Path::new("a.rar")));
        assert!(!is_archive_file(Path::new("a.txt")));
        assert!(!is_archive_file(Path::new("a")));
    }

    #[test]
    fn test_clamp99_never_reaches_100() {
        assert_eq!(clamp99(0, 100), 0);
        assert_eq!(clamp99(50, 100), 50);
        assert_eq!(clamp99(100, 100), 99);
        assert_eq!(clamp99(1000, 100), 99);
    }
}

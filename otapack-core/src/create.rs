//! Streaming archive creation.
//!
//! The creator walks the input set once up front to fix totals, then
//! streams every file into the output container in archive order, emitting
//! one progress snapshot per completed file plus periodic snapshots inside
//! large files. Entry names are archive-relative: the supplied base path
//! is stripped from every source path.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};

use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ArchiveError, Result};
use crate::format::{ArchiveFormat, CompressionLevel};
use crate::progress::{ArchiveCreationProgress, CancelToken, ProgressReader};

struct PlannedEntry {
    src: PathBuf,
    name: String,
    is_dir: bool,
    size: u64,
    mtime: u64,
}

/// Create an archive at `output_path` from `files`, reporting progress
/// through `on_progress`.
///
/// The container format comes from the output path suffix (see
/// [`ArchiveFormat::from_path`]); `level` applies to ZIP output only.
/// Directories expand depth-first, with the directory entry written before
/// its children. Source files are never modified.
///
/// An existing output path is refused up front. On cancellation the
/// partially-written archive is deleted before returning.
pub fn create_archive(
    output_path: &Path,
    files: &[PathBuf],
    base_path: &Path,
    level: CompressionLevel,
    cancel: &CancelToken,
    mut on_progress: impl FnMut(ArchiveCreationProgress),
) -> Result<()> {
    if output_path.exists() {
        return Err(ArchiveError::DestinationExists(output_path.to_path_buf()));
    }

    let format = ArchiveFormat::from_path(output_path);
    let (plan, total_bytes, total_files) = plan_entries(files, base_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let result = write_archive(
        output_path,
        format,
        level,
        &plan,
        total_bytes,
        total_files,
        cancel,
        &mut on_progress,
    );

    if let Err(e) = result {
        if cancel.is_cancelled() {
            let _ = fs::remove_file(output_path);
            return Err(ArchiveError::Cancelled);
        }
        return Err(e);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn write_archive(
    output_path: &Path,
    format: ArchiveFormat,
    level: CompressionLevel,
    plan: &[PlannedEntry],
    total_bytes: u64,
    total_files: u64,
    cancel: &CancelToken,
    on_progress: &mut dyn FnMut(ArchiveCreationProgress),
) -> Result<()> {
    let mut writer = ArchiveWriter::open(output_path, format, level)?;

    let mut files_processed: u64 = 0;
    let mut bytes_processed: u64 = 0;

    on_progress(ArchiveCreationProgress {
        total_files,
        total_bytes,
        ..Default::default()
    });

    for entry in plan {
        if cancel.is_cancelled() {
            return Err(ArchiveError::Cancelled);
        }

        if entry.is_dir {
            writer.add_dir(&entry.name, &entry.src)?;
            continue;
        }

        let src = File::open(&entry.src)?;
        let base = bytes_processed;
        {
            let mut reader = ProgressReader::new(src, cancel, |read| {
                let bytes = base + read;
                on_progress(ArchiveCreationProgress {
                    current_file: entry.name.clone(),
                    percentage: percent(bytes, total_bytes),
                    files_processed,
                    total_files,
                    bytes_processed: bytes,
                    total_bytes,
                });
            });
            writer.add_file(&entry.name, entry.size, entry.mtime, &mut reader)?;
        }

        files_processed += 1;
        bytes_processed = base + entry.size;
        on_progress(ArchiveCreationProgress {
            current_file: entry.name.clone(),
            percentage: percent(bytes_processed, total_bytes),
            files_processed,
            total_files,
            bytes_processed,
            total_bytes,
        });
    }

    writer.finish()
}

/// Expand the input set into archive order: caller order at the top level,
/// depth-first below directories, each directory entry before its children.
fn plan_entries(files: &[PathBuf], base: &Path) -> Result<(Vec<PlannedEntry>, u64, u64)> {
    let mut plan = Vec::new();
    let mut total_bytes: u64 = 0;
    let mut total_files: u64 = 0;

    for input in files {
        let meta = fs::metadata(input)?;
        if meta.is_dir() {
            for item in walkdir::WalkDir::new(input).sort_by_file_name() {
                let item = item.map_err(io::Error::from)?;
                let name = entry_name(item.path(), base);
                if name.is_empty() {
                    continue;
                }
                let meta = item.metadata().map_err(io::Error::from)?;
                let is_dir = meta.is_dir();
                if !is_dir {
                    total_bytes += meta.len();
                    total_files += 1;
                }
                plan.push(PlannedEntry {
                    src: item.path().to_path_buf(),
                    name,
                    is_dir,
                    size: if is_dir { 0 } else { meta.len() },
                    mtime: mtime_of(&meta),
                });
            }
        } else {
            let name = entry_name(input, base);
            if name.is_empty() {
                continue;
            }
            total_bytes += meta.len();
            total_files += 1;
            plan.push(PlannedEntry {
                src: input.clone(),
                name,
                is_dir: false,
                size: meta.len(),
                mtime: mtime_of(&meta),
            });
        }
    }

    Ok((plan, total_bytes, total_files))
}

/// Archive-relative entry name: the base prefix and any leading separator
/// stripped, components joined with `/`.
fn entry_name(path: &Path, base: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    let mut parts: Vec<String> = Vec::new();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_string_lossy().into_owned());
        }
    }
    parts.join("/")
}

fn mtime_of(meta: &fs::Metadata) -> u64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn percent(bytes: u64, total: u64) -> u8 {
    if total == 0 {
        0
    } else {
        (bytes.saturating_mul(100) / total).min(100) as u8
    }
}

enum ArchiveWriter {
    Zip {
        writer: ZipWriter<BufWriter<File>>,
        options: SimpleFileOptions,
    },
    Tar(tar::Builder<BufWriter<File>>),
    TarGz(tar::Builder<GzEncoder<BufWriter<File>>>),
    TarBz2(tar::Builder<BzEncoder<BufWriter<File>>>),
}

impl ArchiveWriter {
    fn open(output_path: &Path, format: ArchiveFormat, level: CompressionLevel) -> Result<Self> {
        let file = BufWriter::new(File::create(output_path)?);
        Ok(match format {
            ArchiveFormat::Zip => {
                let options = if level == CompressionLevel::Store {
                    SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
                } else {
                    SimpleFileOptions::default()
                        .compression_method(CompressionMethod::Deflated)
                        .compression_level(Some(level.deflate_level() as i64))
                };
                ArchiveWriter::Zip {
                    writer: ZipWriter::new(file),
                    options,
                }
            }
            ArchiveFormat::Tar => ArchiveWriter::Tar(tar::Builder::new(file)),
            ArchiveFormat::TarGz => ArchiveWriter::TarGz(tar::Builder::new(GzEncoder::new(
                file,
                flate2::Compression::default(),
            ))),
            ArchiveFormat::TarBz2 => ArchiveWriter::TarBz2(tar::Builder::new(BzEncoder::new(
                file,
                bzip2::Compression::default(),
            ))),
        })
    }

    fn add_dir(&mut self, name: &str, src: &Path) -> Result<()> {
        // One trailing slash exactly, regardless of how the name arrived.
        let name = name.trim_end_matches('/');
        match self {
            ArchiveWriter::Zip { writer, options } => {
                writer.add_directory(name, *options)?;
            }
            ArchiveWriter::Tar(b) => b.append_dir(format!("{}/", name), src)?,
            ArchiveWriter::TarGz(b) => b.append_dir(format!("{}/", name), src)?,
            ArchiveWriter::TarBz2(b) => b.append_dir(format!("{}/", name), src)?,
        }
        Ok(())
    }

    fn add_file(
        &mut self,
        name: &str,
        size: u64,
        mtime: u64,
        reader: &mut dyn Read,
    ) -> Result<()> {
        match self {
            ArchiveWriter::Zip { writer, options } => {
                writer.start_file(name, *options)?;
                io::copy(reader, writer)?;
            }
            ArchiveWriter::Tar(b) => append_tar_file(b, name, size, mtime, reader)?,
            ArchiveWriter::TarGz(b) => append_tar_file(b, name, size, mtime, reader)?,
            ArchiveWriter::TarBz2(b) => append_tar_file(b, name, size, mtime, reader)?,
        }
        Ok(())
    }

    fn finish(self) -> Result<()> {
        match self {
            ArchiveWriter::Zip { writer, .. } => {
                let mut inner = writer.finish()?;
                inner.flush()?;
            }
            ArchiveWriter::Tar(builder) => {
                let mut inner = builder.into_inner()?;
                inner.flush()?;
            }
            ArchiveWriter::TarGz(builder) => {
                let encoder = builder.into_inner()?;
                let mut inner = encoder.finish()?;
                inner.flush()?;
            }
            ArchiveWriter::TarBz2(builder) => {
                let encoder = builder.into_inner()?;
                let mut inner = encoder.finish()?;
                inner.flush()?;
            }
        }
        Ok(())
    }
}

fn append_tar_file<W: Write>(
    builder: &mut tar::Builder<W>,
    name: &str,
    size: u64,
    mtime: u64,
    reader: &mut dyn Read,
) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(size);
    header.set_mode(0o644);
    header.set_mtime(mtime);
    builder.append_data(&mut header, name, reader)?;
    Ok(())
}

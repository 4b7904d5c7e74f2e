//! Navigation into archives nested inside other archives.

use std::fs::File;
use std::io::{self, BufReader, Seek, SeekFrom};
use std::path::Path;

use crate::entry::ArchiveEntry;
use crate::error::{ArchiveError, Result};
use crate::extract::{list_tar, list_zip, reader_for, ReaderKind};

/// List the contents of an archive stored as an entry of another archive.
///
/// The outer archive is scanned for an entry whose name equals
/// `nested_path`; that entry's bytes are spooled to an anonymous tempfile
/// and a fresh reader (chosen from the nested name's extension) walks it.
/// Only the inner archive's entries are returned, never the outer
/// remainder.
///
/// Depth is one level per call; callers can chain calls by extracting the
/// inner archive first. Spooling bounds memory to disk, not RAM.
pub fn list_nested_archive_contents(
    archive_path: &Path,
    nested_path: &str,
) -> Result<Vec<ArchiveEntry>> {
    let outer = reader_for(archive_path)?;
    let mut spool = tempfile::tempfile()?;

    match outer {
        ReaderKind::Zip => {
            let mut zip = zip::ZipArchive::new(BufReader::new(File::open(archive_path)?))?;
            let mut entry = match zip.by_name(nested_path) {
                Ok(entry) => entry,
                Err(zip::result::ZipError::FileNotFound) => {
                    return Err(ArchiveError::EntryNotFound {
                        entry: nested_path.to_string(),
                    })
                }
                Err(e) => return Err(e.into()),
            };
            io::copy(&mut entry, &mut spool)?;
        }
        ReaderKind::Tar(codec) => {
            let mut archive = tar::Archive::new(codec.decoder(File::open(archive_path)?));
            let mut found = false;
            for entry in archive.entries()? {
                let mut entry = entry?;
                let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
                if name == nested_path {
                    io::copy(&mut entry, &mut spool)?;
                    found = true;
                    break;
                }
            }
            if !found {
                return Err(ArchiveError::EntryNotFound {
                    entry: nested_path.to_string(),
                });
            }
        }
    }

    spool.seek(SeekFrom::Start(0))?;
    match reader_for(Path::new(nested_path))? {
        ReaderKind::Zip => list_zip(spool),
        ReaderKind::Tar(codec) => list_tar(spool, codec),
    }
}

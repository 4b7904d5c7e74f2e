//! Archive format and compression-level model.

use std::path::Path;

/// Output container format, chosen from the target path's suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
    TarBz2,
}

impl ArchiveFormat {
    /// Canonical file extension for the format (no leading dot).
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::TarBz2 => "tar.bz2",
        }
    }

    /// Detect the output format from a target path.
    ///
    /// Compound suffixes are matched before single ones so `x.tar.gz` is
    /// never classified as `.gz` or `.tar`. Anything unrecognized falls
    /// back to ZIP.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            ArchiveFormat::TarGz
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
            ArchiveFormat::TarBz2
        } else if name.ends_with(".tar") {
            ArchiveFormat::Tar
        } else {
            ArchiveFormat::Zip
        }
    }
}

/// Named compression levels mapped onto deflate levels.
///
/// The level only applies to ZIP output; tarball compression is selected
/// by codec (gzip/bzip2), not by level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    Store,
    Fastest,
    Fast,
    Normal,
    Good,
    Best,
}

impl CompressionLevel {
    pub fn deflate_level(&self) -> u32 {
        match self {
            CompressionLevel::Store => 0,
            CompressionLevel::Fastest => 1,
            CompressionLevel::Fast => 3,
            CompressionLevel::Normal => 6,
            CompressionLevel::Good => 7,
            CompressionLevel::Best => 9,
        }
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        CompressionLevel::Normal
    }
}

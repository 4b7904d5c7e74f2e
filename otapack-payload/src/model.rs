//! Domain model derived from a parsed payload.
//!
//! These types are what callers consume; the wire messages in
//! [`crate::manifest`] never leave this crate. Everything here is built
//! once by a full parse and read-only afterward.

use std::fmt;
use std::path::PathBuf;

use crate::header::PayloadHeader;
use crate::manifest::install_operation::Type as WireType;

/// Install operation kinds surfaced to callers.
///
/// Wire values outside this set (MOVE, BSDIFF, the LZ4/zstd diff family)
/// map to `Unknown` rather than failing the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallOpKind {
    Replace,
    ReplaceBz,
    ReplaceXz,
    Zero,
    Discard,
    SourceCopy,
    SourceBsdiff,
    Puffdiff,
    Unknown,
}

impl InstallOpKind {
    pub(crate) fn from_wire(value: i32) -> Self {
        match WireType::try_from(value) {
            Ok(WireType::Replace) => InstallOpKind::Replace,
            Ok(WireType::ReplaceBz) => InstallOpKind::ReplaceBz,
            Ok(WireType::ReplaceXz) => InstallOpKind::ReplaceXz,
            Ok(WireType::Zero) => InstallOpKind::Zero,
            Ok(WireType::Discard) => InstallOpKind::Discard,
            Ok(WireType::SourceCopy) => InstallOpKind::SourceCopy,
            Ok(WireType::SourceBsdiff) => InstallOpKind::SourceBsdiff,
            Ok(WireType::Puffdiff) => InstallOpKind::Puffdiff,
            _ => InstallOpKind::Unknown,
        }
    }
}

impl fmt::Display for InstallOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallOpKind::Replace => "REPLACE",
            InstallOpKind::ReplaceBz => "REPLACE_BZ",
            InstallOpKind::ReplaceXz => "REPLACE_XZ",
            InstallOpKind::Zero => "ZERO",
            InstallOpKind::Discard => "DISCARD",
            InstallOpKind::SourceCopy => "SOURCE_COPY",
            InstallOpKind::SourceBsdiff => "SOURCE_BSDIFF",
            InstallOpKind::Puffdiff => "PUFFDIFF",
            InstallOpKind::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// A contiguous run of fixed-size blocks in the destination image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockExtent {
    pub start_block: u64,
    pub num_blocks: u64,
}

/// One install operation with its data location resolved to an absolute
/// file offset (data-section base already added).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionOperation {
    pub kind: InstallOpKind,
    pub data_offset: u64,
    pub data_length: u64,
    pub dst_extents: Vec<BlockExtent>,
}

/// Best-effort compression classification for a partition.
///
/// Inferred from which replace variants appear among the partition's
/// operations; the manifest has no per-partition compression tag, so this
/// is an approximation, not ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionHint {
    Xz,
    Bzip2,
    None,
    Unknown,
}

impl CompressionHint {
    pub(crate) fn infer(operations: &[PartitionOperation]) -> Self {
        let has = |kind: InstallOpKind| operations.iter().any(|op| op.kind == kind);
        if has(InstallOpKind::ReplaceXz) {
            CompressionHint::Xz
        } else if has(InstallOpKind::ReplaceBz) {
            CompressionHint::Bzip2
        } else if has(InstallOpKind::Replace) {
            CompressionHint::None
        } else {
            CompressionHint::Unknown
        }
    }
}

impl fmt::Display for CompressionHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompressionHint::Xz => "xz",
            CompressionHint::Bzip2 => "bzip2",
            CompressionHint::None => "none",
            CompressionHint::Unknown => "unknown",
        })
    }
}

/// A named destination image assembled from an ordered operation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadPartition {
    pub name: String,
    /// Sum of the operations' data lengths.
    pub compressed_size: u64,
    /// Size of the assembled image, from the manifest's partition info.
    pub uncompressed_size: u64,
    /// Hex digest of the assembled image, from the manifest.
    pub hash: String,
    pub compression: CompressionHint,
    /// Absolute file offset of the partition's first operation data.
    pub offset: u64,
    pub operations: Vec<PartitionOperation>,
}

/// Aggregate result of a full payload parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadInfo {
    pub header: PayloadHeader,
    pub partitions: Vec<PayloadPartition>,
    pub total_size: u64,
    pub file_path: PathBuf,
}

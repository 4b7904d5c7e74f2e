//! Payload parsing: header, manifest, and the derived domain model.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use prost::Message;
use sha2::{Digest, Sha256};

use crate::error::{PayloadError, Result};
use crate::header::{PayloadHeader, DEFAULT_BLOCK_SIZE, HEADER_SIZE};
use crate::manifest::DeltaArchiveManifest;
use crate::model::{
    BlockExtent, CompressionHint, InstallOpKind, PartitionOperation, PayloadInfo,
    PayloadPartition,
};

/// Parse only the fixed header of `path`.
pub fn parse_header(path: &Path) -> Result<PayloadHeader> {
    let mut file = File::open(path)?;
    PayloadHeader::read(&mut file)
}

/// Full parse: header, manifest, and per-partition operation model.
///
/// All-or-nothing; a failure at any stage returns an error and no partial
/// [`PayloadInfo`].
pub fn parse_payload_info(path: &Path) -> Result<PayloadInfo> {
    let mut file = File::open(path)?;
    let total_size = file.metadata()?.len();

    let mut header = PayloadHeader::read(&mut file)?;
    if header.manifest_size > total_size.saturating_sub(HEADER_SIZE) {
        return Err(PayloadError::Truncated {
            needed: HEADER_SIZE.saturating_add(header.manifest_size),
            available: total_size,
        });
    }

    file.seek(SeekFrom::Start(HEADER_SIZE))?;
    let mut buf = vec![0u8; header.manifest_size as usize];
    file.read_exact(&mut buf)?;
    let manifest = DeltaArchiveManifest::decode(buf.as_slice())?;

    if manifest.partitions.is_empty() {
        return Err(PayloadError::NoPartitions);
    }
    header.block_size = manifest
        .block_size
        .map(u64::from)
        .unwrap_or(DEFAULT_BLOCK_SIZE);

    let base = header.data_section_base();
    let mut partitions = Vec::with_capacity(manifest.partitions.len());

    for update in &manifest.partitions {
        let mut operations = Vec::with_capacity(update.operations.len());
        for op in &update.operations {
            let data_length = op.data_length.unwrap_or(0);
            let data_offset = base + op.data_offset.unwrap_or(0);
            if data_length > 0 && data_offset.saturating_add(data_length) > total_size {
                return Err(PayloadError::DataOutOfBounds {
                    partition: update.partition_name.clone(),
                    offset: data_offset,
                    length: data_length,
                    file_size: total_size,
                });
            }
            operations.push(PartitionOperation {
                kind: InstallOpKind::from_wire(op.r#type),
                data_offset,
                data_length,
                dst_extents: op
                    .dst_extents
                    .iter()
                    .map(|e| BlockExtent {
                        start_block: e.start_block.unwrap_or(0),
                        num_blocks: e.num_blocks.unwrap_or(0),
                    })
                    .collect(),
            });
        }

        let compressed_size: u64 = operations.iter().map(|op| op.data_length).sum();
        let new_info = update.new_partition_info.as_ref();
        let uncompressed_size = new_info.and_then(|i| i.size).unwrap_or(0);
        let hash = new_info
            .and_then(|i| i.hash.as_ref())
            .map(hex::encode)
            .unwrap_or_default();

        // Extent totals and the manifest's partition size do not have to
        // reconcile: hash-tree and FEC extents live outside the modeled
        // subset. A mismatch is reported, not fatal.
        let extent_blocks: u64 = operations
            .iter()
            .flat_map(|op| op.dst_extents.iter())
            .map(|e| e.num_blocks)
            .sum();
        let extent_bytes = extent_blocks.saturating_mul(header.block_size);
        if uncompressed_size != 0 && extent_bytes != uncompressed_size {
            log::warn!(
                "extent_mismatch partition={} extent_bytes={} partition_size={}",
                update.partition_name,
                extent_bytes,
                uncompressed_size
            );
        }

        let compression = CompressionHint::infer(&operations);
        let offset = operations.first().map(|op| op.data_offset).unwrap_or(base);
        partitions.push(PayloadPartition {
            name: update.partition_name.clone(),
            compressed_size,
            uncompressed_size,
            hash,
            compression,
            offset,
            operations,
        });
    }

    Ok(PayloadInfo {
        header,
        partitions,
        total_size,
        file_path: path.to_path_buf(),
    })
}

/// SHA-256 of the whole payload file, hex-encoded.
pub fn file_digest(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

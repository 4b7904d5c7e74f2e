//! Fixed binary header of a payload file.
//!
//! Wire layout (all integers little-endian):
//!
//! | Offset | Size | Field                   |
//! |--------|------|-------------------------|
//! | 0      | 4    | magic `"CrAU"`          |
//! | 4      | 8    | version                 |
//! | 12     | 8    | manifest size           |
//! | 20     | 4    | manifest signature size |
//! | 24     | ...  | manifest, signature, data section |

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{PayloadError, Result};

/// ASCII magic at offset 0.
pub const PAYLOAD_MAGIC: [u8; 4] = *b"CrAU";

/// Size of the fixed header preceding the manifest.
pub const HEADER_SIZE: u64 = 24;

/// Block size assumed until the manifest provides one.
pub const DEFAULT_BLOCK_SIZE: u64 = 4096;

/// Parsed fixed header. Immutable once read; `block_size` starts at the
/// default and is replaced by the manifest's value during a full parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadHeader {
    pub version: u64,
    pub manifest_size: u64,
    pub manifest_signature_size: u32,
    pub block_size: u64,
}

impl PayloadHeader {
    /// Read the header from the current position of `reader`.
    pub(crate) fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != PAYLOAD_MAGIC {
            return Err(PayloadError::BadMagic(magic));
        }

        let version = reader.read_u64::<LittleEndian>()?;
        let manifest_size = reader.read_u64::<LittleEndian>()?;
        let manifest_signature_size = reader.read_u32::<LittleEndian>()?;

        Ok(PayloadHeader {
            version,
            manifest_size,
            manifest_signature_size,
            block_size: DEFAULT_BLOCK_SIZE,
        })
    }

    /// First byte of the data section: header, manifest and signature all
    /// precede it. Operation data offsets in the manifest are relative to
    /// this base.
    pub fn data_section_base(&self) -> u64 {
        HEADER_SIZE + self.manifest_size + u64::from(self.manifest_signature_size)
    }
}

/// True iff `path` is at least header-sized and starts with the payload
/// magic. Never errors; any I/O failure classifies as "not a payload".
pub fn is_payload_file(path: &Path) -> bool {
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    if meta.len() < HEADER_SIZE {
        return false;
    }
    let Ok(mut file) = File::open(path) else {
        return false;
    };
    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_err() {
        return false;
    }
    magic == PAYLOAD_MAGIC
}

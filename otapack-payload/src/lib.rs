//! Parser for Android OTA `payload.bin` files.
//!
//! A payload is a fixed binary header (`"CrAU"` magic plus little-endian
//! size fields), a protobuf manifest describing per-partition install
//! operations, an opaque signature blob, and a data section holding the
//! operation payloads. This crate parses the header and manifest into a
//! read-only [`PayloadInfo`] model; it never applies operations or writes
//! partition images.
//!
//! Parsing is all-or-nothing: any failure (bad magic, short read,
//! malformed manifest) is a typed [`PayloadError`] and no partial
//! `PayloadInfo` is ever produced.

pub mod error;
pub mod header;
pub mod manifest;
pub mod model;
pub mod reader;

pub use error::{PayloadError, Result};
pub use header::{is_payload_file, PayloadHeader, HEADER_SIZE, PAYLOAD_MAGIC};
pub use model::{
    BlockExtent, CompressionHint, InstallOpKind, PartitionOperation, PayloadInfo,
    PayloadPartition,
};
pub use reader::{file_digest, parse_header, parse_payload_info};

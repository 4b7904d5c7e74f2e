//! Wire-format manifest messages.
//!
//! Hand-written prost structs for the subset of the update-engine
//! `update_metadata` schema this crate consumes. Field tags match the
//! public schema; unknown fields are skipped by prost during decode, so a
//! manifest from a newer OTA still parses.

/// A contiguous run of blocks in a partition image.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Extent {
    #[prost(uint64, optional, tag = "1")]
    pub start_block: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "2")]
    pub num_blocks: ::core::option::Option<u64>,
}

/// Size and digest of a whole partition image.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PartitionInfo {
    #[prost(uint64, optional, tag = "1")]
    pub size: ::core::option::Option<u64>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub hash: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

/// One instruction for materializing part of a partition.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InstallOperation {
    #[prost(enumeration = "install_operation::Type", tag = "1")]
    pub r#type: i32,
    /// Offset into the data section, relative to its base.
    #[prost(uint64, optional, tag = "2")]
    pub data_offset: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "3")]
    pub data_length: ::core::option::Option<u64>,
    #[prost(message, repeated, tag = "4")]
    pub src_extents: ::prost::alloc::vec::Vec<Extent>,
    #[prost(message, repeated, tag = "6")]
    pub dst_extents: ::prost::alloc::vec::Vec<Extent>,
    #[prost(bytes = "vec", optional, tag = "8")]
    pub data_sha256_hash: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

pub mod install_operation {
    /// Wire operation types. Values past `Puffdiff` exist in newer
    /// schemas and map to the domain `Unknown` kind.
    #[derive(
        Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
    )]
    #[repr(i32)]
    pub enum Type {
        Replace = 0,
        Move = 1,
        Bsdiff = 2,
        ReplaceBz = 3,
        SourceCopy = 4,
        SourceBsdiff = 5,
        Zero = 6,
        Discard = 7,
        ReplaceXz = 8,
        Puffdiff = 9,
        BrotliBsdiff = 10,
        Zucchini = 11,
        Lz4diffBsdiff = 12,
        Lz4diffPuffdiff = 13,
        Zstd = 14,
    }
}

/// Update description for one named partition.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PartitionUpdate {
    #[prost(string, tag = "1")]
    pub partition_name: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "6")]
    pub old_partition_info: ::core::option::Option<PartitionInfo>,
    #[prost(message, optional, tag = "7")]
    pub new_partition_info: ::core::option::Option<PartitionInfo>,
    #[prost(message, repeated, tag = "8")]
    pub operations: ::prost::alloc::vec::Vec<InstallOperation>,
}

/// Top-level manifest.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeltaArchiveManifest {
    #[prost(uint32, optional, tag = "3")]
    pub block_size: ::core::option::Option<u32>,
    #[prost(uint64, optional, tag = "4")]
    pub signatures_offset: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "5")]
    pub signatures_size: ::core::option::Option<u64>,
    #[prost(uint32, optional, tag = "12")]
    pub minor_version: ::core::option::Option<u32>,
    #[prost(message, repeated, tag = "13")]
    pub partitions: ::prost::alloc::vec::Vec<PartitionUpdate>,
    #[prost(int64, optional, tag = "14")]
    pub max_timestamp: ::core::option::Option<i64>,
}

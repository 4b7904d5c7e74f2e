use std::io;

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("not a payload file: bad magic {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("payload is truncated: need {needed} bytes, file has {available}")]
    Truncated { needed: u64, available: u64 },

    #[error("manifest does not decode: {0}")]
    Manifest(#[from] prost::DecodeError),

    #[error("manifest lists no partitions")]
    NoPartitions,

    #[error(
        "operation data out of bounds in partition '{partition}': \
         offset {offset} + length {length} exceeds file size {file_size}"
    )]
    DataOutOfBounds {
        partition: String,
        offset: u64,
        length: u64,
        file_size: u64,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, PayloadError>;

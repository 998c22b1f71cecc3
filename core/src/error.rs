use thiserror::Error;

#[derive(Debug, Error)]
pub enum FatxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid volume: {0}")]
    InvalidVolume(String),

    #[error("Read of {len} bytes at offset {offset:#x} is outside the {window:#x}-byte partition window")]
    OutOfRange { offset: u64, len: u64, window: u64 },

    #[error("Corrupt cluster chain: {0}")]
    CorruptChain(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("Read of {size} bytes at offset {offset} is outside file of size {file_size}")]
    InvalidRange { offset: u64, size: u64, file_size: u64 },

    #[error("Invalid filename in directory entry: {0}")]
    InvalidName(String),
}

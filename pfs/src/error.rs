//! Error types for PFS archive parsing and writing

use thiserror::Error;

/// Result type for PFS operations
pub type Result<T> = std::result::Result<T, Error>;

/// PFS error types
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid magic token in the archive header
    #[error("Invalid PFS magic: expected 'PFS ', got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Header or directory is structurally impossible
    #[error("Invalid archive structure: {0}")]
    InvalidStructure(String),

    /// Cursor positioned outside the buffer
    #[error("Position {position} is out of range, buffer is {len} bytes")]
    PositionOutOfRange { position: u64, len: u64 },

    /// A chunk's payload did not inflate to its declared length
    #[error("Chunk size mismatch: declared {declared} bytes, inflated {actual}")]
    ChunkSizeMismatch { declared: u32, actual: u32 },

    /// Chunk payload failed to inflate at all
    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    /// The archive has no name-list block
    #[error("Archive has no name-list directory record")]
    MissingNameList,

    /// A directory record's hash matched none of the listed names
    #[error("Directory hash {0:#010x} matches no name in the name list")]
    UnboundDirectoryHash(i32),

    /// C string is not valid UTF-8
    #[error("Name is not valid UTF-8")]
    InvalidName,

    /// Rename source does not exist
    #[error("File not found in archive: {0}")]
    FileNotFound(String),
}

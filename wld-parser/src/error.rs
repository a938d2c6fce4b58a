//! Error types for WLD parsing

use thiserror::Error;

/// Result type for WLD operations
pub type Result<T> = std::result::Result<T, Error>;

/// WLD error types
#[derive(Error, Debug)]
pub enum Error {
    /// Cursor error from the underlying buffer
    #[error("Cursor error: {0}")]
    Cursor(#[from] pfs::Error),

    /// Invalid WLD magic word
    #[error("Invalid WLD magic: {0:#010x}")]
    InvalidMagic(u32),

    /// Version word is neither the old nor the new format
    #[error("Unsupported WLD version word: {0:#010x}")]
    UnsupportedVersion(u32),

    /// A fragment body did not decode
    #[error("Fragment {index} (kind {kind:#04x}) failed to decode: {reason}")]
    BadFragment {
        index: usize,
        kind: u32,
        reason: String,
    },

    /// An embedded string is not valid UTF-8 or is otherwise unusable
    #[error("Invalid string data: {0}")]
    InvalidString(String),

    /// Skeleton child indices form a cycle or point outside the bone list
    #[error("Skeleton bone tree is not a tree: {0}")]
    InvalidBoneTree(String),

    /// Region string does not follow the positional grammar
    #[error("Malformed region string {0:?}")]
    MalformedRegionString(String),
}

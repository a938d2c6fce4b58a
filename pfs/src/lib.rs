//! PFS archive container library
//!
//! PFS is the directory-indexed, chunk-compressed container format used by
//! EverQuest client assets (`.s3d`, `.eqg`, `.pak`). An archive is a flat
//! set of named files; each file's payload is stored as a sequence of
//! independently deflated chunks, and the directory binds chunk streams to
//! names through a CRC-style hash of the lowercased name.
//!
//! This crate provides a symmetric reader and writer:
//!
//! ```
//! use pfs::Archive;
//!
//! let mut archive = Archive::new();
//! archive.set("gequip.wld", b"payload".to_vec());
//! let bytes = archive.save()?;
//!
//! let reopened = Archive::load(&bytes)?;
//! assert_eq!(reopened.get("GEQUIP.WLD")?.as_deref(), Some(&b"payload"[..]));
//! # Ok::<(), pfs::Error>(())
//! ```

pub mod archive;
pub mod chunk;
pub mod crc;
pub mod cursor;
pub mod error;

pub use archive::Archive;
pub use cursor::ByteCursor;
pub use error::{Error, Result};

/// Magic token at byte offset 4 of every archive.
pub const PFS_MAGIC: [u8; 4] = *b"PFS ";

/// Reserved/version word at byte offset 8.
pub const PFS_VERSION: u32 = 0x0002_0000;

/// Directory hash reserved for the name-list block. No real file name
/// hashes to this value.
pub const DIRECTORY_SENTINEL: i32 = 0x61580AC9_u32 as i32;

/// Optional footer tag after the last directory record, followed by a
/// `u32` timestamp.
pub const FOOTER_TAG: [u8; 5] = *b"STEVE";

//! Bitmap source fragments: texture file name lists (0x03), animation
//! tables over them (0x04), and the indirection record (0x05).

use crate::doc::{FragmentRef, StringRef};
use crate::string_pool;
use crate::{Error, Result};
use pfs::ByteCursor;

/// Kind 0x03. A list of texture file names, each stored length-prefixed
/// and obfuscated with the pool key at phase 0.
#[derive(Debug, Clone)]
pub struct BitmapName {
    pub name_ref: StringRef,
    pub filenames: Vec<String>,
}

impl BitmapName {
    pub fn decode(name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let count = cursor.read_u32()?;
        let mut filenames = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let len = cursor.read_u16()? as usize;
            let mut bytes = cursor.read_bytes(len)?.to_vec();
            // Inline strings restart the key, unlike pool strings.
            string_pool::crypt(&mut bytes, 0);
            if bytes.last() == Some(&0) {
                bytes.pop();
            }
            let name = String::from_utf8(bytes)
                .map_err(|_| Error::InvalidString("bitmap file name is not UTF-8".into()))?;
            filenames.push(name);
        }
        Ok(Self {
            name_ref,
            filenames,
        })
    }
}

/// Kind 0x04. Binds one or more 0x03 name lists into a (possibly
/// animated) texture, with flag-gated playback fields.
#[derive(Debug, Clone)]
pub struct BitmapInfo {
    pub name_ref: StringRef,
    pub flags: u32,
    /// Present when `HAS_CURRENT_FRAME` is set.
    pub current_frame: Option<u32>,
    /// Milliseconds between frames; present when `HAS_SLEEP` is set.
    pub sleep_ms: Option<u32>,
    pub frames: Vec<FragmentRef>,
}

impl BitmapInfo {
    pub const ANIMATED: u32 = 0x08;
    pub const HAS_SLEEP: u32 = 0x10;
    pub const HAS_CURRENT_FRAME: u32 = 0x20;
    pub const SKIP_FRAMES: u32 = 0x40;

    pub fn decode(name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let flags = cursor.read_u32()?;
        let count = cursor.read_u32()?;
        // Flag-gated fields appear in flag-bit order.
        let current_frame = if flags & Self::HAS_CURRENT_FRAME != 0 {
            Some(cursor.read_u32()?)
        } else {
            None
        };
        let sleep_ms = if flags & Self::HAS_SLEEP != 0 {
            Some(cursor.read_u32()?)
        } else {
            None
        };
        let mut frames = Vec::with_capacity(count as usize);
        for _ in 0..count {
            frames.push(FragmentRef::read(cursor)?);
        }
        Ok(Self {
            name_ref,
            flags,
            current_frame,
            sleep_ms,
            frames,
        })
    }

    pub fn is_animated(&self) -> bool {
        self.flags & Self::ANIMATED != 0
    }
}

/// Kind 0x05. Points at a 0x04.
#[derive(Debug, Clone)]
pub struct BitmapInfoRef {
    pub name_ref: StringRef,
    pub target: FragmentRef,
    pub flags: u32,
}

impl BitmapInfoRef {
    pub fn decode(name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            name_ref,
            target: FragmentRef::read(cursor)?,
            flags: cursor.read_u32()?,
        })
    }
}

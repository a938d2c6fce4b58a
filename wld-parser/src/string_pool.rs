//! The shared string pool of a WLD document.
//!
//! Every named fragment points into one contiguous byte region carried
//! just after the file header. Strings are addressed by byte offset, not
//! index, and read until a NUL. The pool itself does not record which
//! convention a given string uses; most are stored obfuscated with the
//! client's repeating 8-byte XOR key, while some later additions are
//! plain. The fragment decoders know per field which accessor applies.

/// The client's repeating XOR key. XOR is its own inverse, so the same
/// transform obfuscates and de-obfuscates.
pub const XOR_KEY: [u8; 8] = [0x95, 0x3A, 0xC5, 0x2A, 0x95, 0x7A, 0x95, 0x6A];

/// XOR `bytes` in place against [`XOR_KEY`], with the key phase aligned to
/// `phase` (the absolute offset of `bytes[0]` within its pool).
pub fn crypt(bytes: &mut [u8], phase: usize) {
    for (i, b) in bytes.iter_mut().enumerate() {
        *b ^= XOR_KEY[(phase + i) % XOR_KEY.len()];
    }
}

/// Byte-offset-addressed table of NUL-terminated strings.
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    raw: Vec<u8>,
}

impl StringPool {
    /// Wrap the raw pool region exactly as stored in the file.
    pub fn new(raw: Vec<u8>) -> Self {
        Self { raw }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Read a plain string at `offset`.
    pub fn plain_at(&self, offset: usize) -> Option<String> {
        let tail = self.raw.get(offset..)?;
        let end = tail.iter().position(|&b| b == 0)?;
        String::from_utf8(tail[..end].to_vec()).ok()
    }

    /// De-obfuscate and read a string at `offset`. The key phase follows
    /// the absolute pool offset, because the client obfuscates the pool as
    /// one run from its start.
    pub fn decoded_at(&self, offset: usize) -> Option<String> {
        let tail = self.raw.get(offset..)?;
        let mut out = Vec::new();
        for (i, &b) in tail.iter().enumerate() {
            let plain = b ^ XOR_KEY[(offset + i) % XOR_KEY.len()];
            if plain == 0 {
                return String::from_utf8(out).ok();
            }
            out.push(plain);
        }
        // Ran off the end of the pool without a terminator
        None
    }
}

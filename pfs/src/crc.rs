//! The CRC-style directory hash binding archive names to records.
//!
//! PFS directories never store file names next to their records; a record
//! carries only this hash of the name, and the names themselves live in a
//! reserved name-list block. The hash is an MSB-first table-driven CRC over
//! the IEEE 802.3 polynomial, with no initial value and no final XOR, fed
//! the lowercased name plus one trailing NUL.
//!
//! Interoperability requires a bit-for-bit match with the client, so the
//! parameters here are not tunable.

use std::sync::LazyLock;

/// MSB-first CRC polynomial (IEEE 802.3, un-reflected).
const POLYNOMIAL: u32 = 0x04C11DB7;

static TABLE: LazyLock<[u32; 256]> = LazyLock::new(|| {
    let mut table = [0u32; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut c = (i as u32) << 24;
        for _ in 0..8 {
            c = if c & 0x8000_0000 != 0 {
                (c << 1) ^ POLYNOMIAL
            } else {
                c << 1
            };
        }
        *entry = c;
    }
    table
});

/// Hash raw bytes with the directory CRC.
pub fn hash_bytes(bytes: &[u8]) -> i32 {
    let mut crc = 0u32;
    for &b in bytes {
        crc = (crc << 8) ^ TABLE[(((crc >> 24) as u8) ^ b) as usize];
    }
    crc as i32
}

/// Hash an archive file name the way the directory does: lowercase the
/// name, then hash its bytes followed by one NUL terminator.
pub fn hash_name(name: &str) -> i32 {
    let normalized = name.to_ascii_lowercase();
    let mut bytes = Vec::with_capacity(normalized.len() + 1);
    bytes.extend_from_slice(normalized.as_bytes());
    bytes.push(0);
    hash_bytes(&bytes)
}

//! The archive reader and writer.
//!
//! Layout, all little-endian:
//!
//! ```text
//! 0..4    directory byte offset
//! 4..8    magic "PFS "
//! 8..12   reserved word 0x00020000
//! ...     chunk streams, one per stored file, then the name-list stream
//! dir     entry count, then count x {hash: i32, offset: u32, size: u32}
//! after   optional "STEVE" tag + u32 timestamp
//! ```
//!
//! Directory records carry no names. One record's hash is the reserved
//! [`DIRECTORY_SENTINEL`]; its payload lists every file name, and each
//! remaining record is bound to a name by [`crc::hash_name`]. Binding is
//! first match by hash value: two distinct names that collide would bind to
//! the same record. The format has no defense against this and neither do
//! we; see the crate documentation for the known risk.

use crate::chunk::{compress_blocks, decompress_blocks, scan_blocks};
use crate::cursor::ByteCursor;
use crate::{crc, DIRECTORY_SENTINEL, Error, FOOTER_TAG, PFS_MAGIC, PFS_VERSION, Result};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

const HEADER_SIZE: usize = 12;
const DIRECTORY_RECORD_SIZE: usize = 12;

#[derive(Debug, Clone)]
enum EntryData {
    /// Raw chunk stream exactly as stored; inflated lazily on [`Archive::get`].
    Stored { stream: Vec<u8>, inflated_size: u32 },
    /// Plain bytes from [`Archive::set`]; chunked and deflated on save.
    Plain(Vec<u8>),
}

/// An in-memory PFS archive: an unordered mapping from canonical
/// (lowercase) file name to payload.
///
/// The archive is either fully loaded or not yet opened; there is no
/// partial or streaming state. Methods that mutate are not designed for
/// concurrent writers.
#[derive(Debug, Clone, Default)]
pub struct Archive {
    entries: HashMap<String, EntryData>,
    /// Canonical names in insertion order; save order follows it.
    order: Vec<String>,
    /// Footer timestamp, if the source archive carried one. Round-tripped
    /// on save.
    pub timestamp: Option<u32>,
}

impl Archive {
    /// Create an empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an archive from its full byte image.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(bytes);

        let directory_offset = cursor.read_u32()?;
        let mut magic = [0u8; 4];
        magic.copy_from_slice(cursor.read_bytes(4)?);
        if magic != PFS_MAGIC {
            return Err(Error::InvalidMagic(magic));
        }
        let version = cursor.read_u32()?;
        if version != PFS_VERSION {
            debug!("unexpected reserved word {version:#010x}, continuing");
        }

        cursor.set_position(u64::from(directory_offset))?;
        let record_count = cursor.read_u32()?;
        let mut records = Vec::with_capacity(record_count as usize);
        for _ in 0..record_count {
            let hash = cursor.read_i32()?;
            let offset = cursor.read_u32()?;
            let size = cursor.read_u32()?;
            records.push((hash, offset, size));
        }

        let timestamp = Self::read_footer(&mut cursor);

        // Locate and decode the name-list block first; everything else is
        // bound through it.
        let &(_, name_list_offset, name_list_size) = records
            .iter()
            .find(|(hash, _, _)| *hash == DIRECTORY_SENTINEL)
            .ok_or(Error::MissingNameList)?;

        cursor.set_position(u64::from(name_list_offset))?;
        let name_list_stream = scan_blocks(&mut cursor, name_list_size)?;
        let name_list = decompress_blocks(name_list_stream, name_list_size)?;
        let names = Self::parse_name_list(&name_list)?;

        let by_hash: HashMap<i32, &String> =
            names.iter().map(|n| (crc::hash_name(n), n)).collect();

        // Bind data records to names. Entries keep their raw chunk streams;
        // inflation happens on `get`.
        let mut file_records: Vec<(&String, u32, u32)> = Vec::with_capacity(records.len());
        for &(hash, offset, size) in &records {
            if hash == DIRECTORY_SENTINEL {
                continue;
            }
            let name = by_hash
                .get(&hash)
                .copied()
                .ok_or(Error::UnboundDirectoryHash(hash))?;
            file_records.push((name, offset, size));
        }

        // Insertion order follows the chunk streams' positions in the file,
        // which is the order the writer stored them.
        file_records.sort_by_key(|&(_, offset, _)| offset);

        let mut archive = Self {
            timestamp,
            ..Self::default()
        };
        for (name, offset, size) in file_records {
            cursor.set_position(u64::from(offset))?;
            let stream = scan_blocks(&mut cursor, size)?;
            archive.insert_entry(
                name.clone(),
                EntryData::Stored {
                    stream: stream.to_vec(),
                    inflated_size: size,
                },
            );
        }

        debug!("loaded archive: {} files", archive.len());
        Ok(archive)
    }

    /// Serialize the archive. File contents and names round-trip exactly;
    /// entries loaded from an existing archive keep their original chunk
    /// streams verbatim.
    pub fn save(&self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; HEADER_SIZE];
        out[4..8].copy_from_slice(&PFS_MAGIC);
        out[8..12].copy_from_slice(&PFS_VERSION.to_le_bytes());

        let mut records: Vec<(i32, u32, u32)> = Vec::with_capacity(self.order.len() + 1);

        for name in &self.order {
            let offset = out.len() as u32;
            let (stream, inflated_size) = match &self.entries[name] {
                EntryData::Stored {
                    stream,
                    inflated_size,
                } => (stream.clone(), *inflated_size),
                EntryData::Plain(bytes) => (compress_blocks(bytes)?, bytes.len() as u32),
            };
            out.extend_from_slice(&stream);
            records.push((crc::hash_name(name), offset, inflated_size));
            trace!("stored {name}: {inflated_size} bytes at offset {offset}");
        }

        let name_list = self.build_name_list();
        let name_list_offset = out.len() as u32;
        out.extend_from_slice(&compress_blocks(&name_list)?);

        let directory_offset = out.len() as u32;
        out.extend_from_slice(&(records.len() as u32 + 1).to_le_bytes());
        for (hash, offset, size) in records {
            out.extend_from_slice(&hash.to_le_bytes());
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
        }
        out.extend_from_slice(&DIRECTORY_SENTINEL.to_le_bytes());
        out.extend_from_slice(&name_list_offset.to_le_bytes());
        out.extend_from_slice(&(name_list.len() as u32).to_le_bytes());

        if let Some(timestamp) = self.timestamp {
            out.extend_from_slice(&FOOTER_TAG);
            out.extend_from_slice(&timestamp.to_le_bytes());
        }

        // Patch the real directory offset into the header placeholder.
        out[0..4].copy_from_slice(&directory_offset.to_le_bytes());

        debug!(
            "saved archive: {} files, directory at {directory_offset}",
            self.order.len()
        );
        Ok(out)
    }

    /// Fetch and inflate a file. Returns `Ok(None)` when the name is not
    /// present; chunk corruption in that file's stream is an error.
    pub fn get(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let canonical = canonicalize(name);
        match self.entries.get(&canonical) {
            None => Ok(None),
            Some(EntryData::Plain(bytes)) => Ok(Some(bytes.clone())),
            Some(EntryData::Stored {
                stream,
                inflated_size,
            }) => Ok(Some(decompress_blocks(stream, *inflated_size)?)),
        }
    }

    /// Insert or replace a file.
    pub fn set(&mut self, name: &str, bytes: Vec<u8>) {
        self.insert_entry(canonicalize(name), EntryData::Plain(bytes));
    }

    /// Remove a file. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let canonical = canonicalize(name);
        if self.entries.remove(&canonical).is_some() {
            self.order.retain(|n| n != &canonical);
            true
        } else {
            false
        }
    }

    /// Rename a file, keeping its position in the stored order. Replaces
    /// any existing file under the new name.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let from = canonicalize(from);
        let to = canonicalize(to);
        let data = self
            .entries
            .remove(&from)
            .ok_or_else(|| Error::FileNotFound(from.clone()))?;
        if self.entries.insert(to.clone(), data).is_some() {
            self.order.retain(|n| n != &to);
        }
        for slot in &mut self.order {
            if *slot == from {
                *slot = to;
                break;
            }
        }
        Ok(())
    }

    /// Whether a file is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&canonicalize(name))
    }

    /// Canonical file names in stored order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of files (the internal name-list block is not a file).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert_entry(&mut self, canonical: String, data: EntryData) {
        if self.entries.insert(canonical.clone(), data).is_none() {
            self.order.push(canonical);
        }
    }

    /// `{name_count: u32, count x {length incl. NUL: u32, bytes}}`
    fn build_name_list(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.order.len() as u32).to_le_bytes());
        for name in &self.order {
            out.extend_from_slice(&(name.len() as u32 + 1).to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.push(0);
        }
        out
    }

    fn parse_name_list(bytes: &[u8]) -> Result<Vec<String>> {
        let mut cursor = ByteCursor::new(bytes);
        let count = cursor.read_u32()?;
        let mut names = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let length = cursor.read_u32()?;
            if length == 0 {
                return Err(Error::InvalidStructure("zero-length file name".into()));
            }
            let raw = cursor.read_bytes(length as usize)?;
            // Length includes the terminator; tolerate a missing one.
            let text = raw.strip_suffix(&[0]).unwrap_or(raw);
            let name =
                std::str::from_utf8(text).map_err(|_| Error::InvalidName)?;
            names.push(name.to_ascii_lowercase());
        }
        Ok(names)
    }

    /// Footer is optional; anything that does not look like one is ignored.
    fn read_footer(cursor: &mut ByteCursor<'_>) -> Option<u32> {
        if cursor.remaining() < (FOOTER_TAG.len() + 4) as u64 {
            return None;
        }
        match cursor.read_bytes(FOOTER_TAG.len()) {
            Ok(tag) if tag == FOOTER_TAG => match cursor.read_u32() {
                Ok(timestamp) => Some(timestamp),
                Err(_) => None,
            },
            Ok(tag) => {
                warn!("unrecognized trailer {tag:02x?}, ignoring");
                None
            }
            Err(_) => None,
        }
    }
}

fn canonicalize(name: &str) -> String {
    name.to_ascii_lowercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_archive_round_trips() {
        let bytes = Archive::new().save().unwrap();
        let archive = Archive::load(&bytes).unwrap();
        assert!(archive.is_empty());
        assert_eq!(archive.timestamp, None);
    }

    #[test]
    fn single_file_round_trips() {
        let mut archive = Archive::new();
        archive.set("chequip.wld", b"fragment data".to_vec());

        let reopened = Archive::load(&archive.save().unwrap()).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(
            reopened.get("chequip.wld").unwrap().as_deref(),
            Some(&b"fragment data"[..])
        );
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut archive = Archive::new();
        archive.set("Palette.BMP", vec![1, 2, 3]);
        assert!(archive.contains("palette.bmp"));
        assert_eq!(archive.get("PALETTE.bmp").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(archive.names().collect::<Vec<_>>(), ["palette.bmp"]);
    }

    #[test]
    fn empty_file_is_representable() {
        let mut archive = Archive::new();
        archive.set("empty.txt", Vec::new());
        archive.set("other.txt", vec![9]);

        let reopened = Archive::load(&archive.save().unwrap()).unwrap();
        assert_eq!(reopened.get("empty.txt").unwrap(), Some(Vec::new()));
        assert_eq!(reopened.get("other.txt").unwrap(), Some(vec![9]));
    }

    #[test]
    fn absent_name_is_none_not_error() {
        let archive = Archive::new();
        assert_eq!(archive.get("missing.wld").unwrap(), None);
    }

    #[test]
    fn bad_magic_is_fatal() {
        let mut bytes = Archive::new().save().unwrap();
        bytes[4..8].copy_from_slice(b"ZIP!");
        assert!(matches!(
            Archive::load(&bytes),
            Err(Error::InvalidMagic(m)) if &m == b"ZIP!"
        ));
    }

    #[test]
    fn truncated_directory_is_fatal() {
        let bytes = {
            let mut archive = Archive::new();
            archive.set("a.txt", vec![1; 100]);
            archive.save().unwrap()
        };
        assert!(Archive::load(&bytes[..bytes.len() - 8]).is_err());
    }

    #[test]
    fn missing_name_list_is_fatal() {
        let mut archive = Archive::new();
        archive.set("a.txt", vec![1]);
        let mut bytes = archive.save().unwrap();

        // Overwrite the sentinel record's hash (last directory record).
        let footer = if archive.timestamp.is_some() { 9 } else { 0 };
        let sentinel_hash_at = bytes.len() - footer - DIRECTORY_RECORD_SIZE;
        bytes[sentinel_hash_at..sentinel_hash_at + 4].copy_from_slice(&0u32.to_le_bytes());

        assert!(matches!(Archive::load(&bytes), Err(Error::MissingNameList)));
    }

    #[test]
    fn unbound_hash_is_fatal() {
        let mut archive = Archive::new();
        archive.set("a.txt", vec![1]);
        let mut bytes = archive.save().unwrap();

        // Corrupt the first directory record's hash so it matches no name.
        let directory_offset =
            u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
        let first_record = directory_offset + 4;
        bytes[first_record..first_record + 4].copy_from_slice(&0x1234_5678u32.to_le_bytes());

        assert!(matches!(
            Archive::load(&bytes),
            Err(Error::UnboundDirectoryHash(0x1234_5678))
        ));
    }

    #[test]
    fn chunk_corruption_surfaces_on_get_not_load() {
        let mut archive = Archive::new();
        archive.set("big.dat", vec![0xAB; 5000]);
        let mut bytes = archive.save().unwrap();

        // The first chunk stream starts right after the header; flip bytes
        // inside its zlib payload.
        bytes[HEADER_SIZE + 8] ^= 0xFF;
        bytes[HEADER_SIZE + 9] ^= 0xFF;

        let reopened = Archive::load(&bytes).unwrap();
        assert!(reopened.get("big.dat").is_err());
    }

    #[test]
    fn timestamp_round_trips() {
        let mut archive = Archive::new();
        archive.set("a.txt", vec![1]);
        archive.timestamp = Some(0x5E0C_1234);

        let reopened = Archive::load(&archive.save().unwrap()).unwrap();
        assert_eq!(reopened.timestamp, Some(0x5E0C_1234));
    }

    #[test]
    fn remove_and_rename() {
        let mut archive = Archive::new();
        archive.set("one.txt", vec![1]);
        archive.set("two.txt", vec![2]);

        assert!(archive.remove("ONE.txt"));
        assert!(!archive.remove("one.txt"));
        assert_eq!(archive.len(), 1);

        archive.rename("two.txt", "three.txt").unwrap();
        assert_eq!(archive.get("three.txt").unwrap(), Some(vec![2]));
        assert!(!archive.contains("two.txt"));
        assert!(archive.rename("two.txt", "four.txt").is_err());
    }

    #[test]
    fn stored_order_follows_insertion() {
        let mut archive = Archive::new();
        archive.set("zebra.bmp", vec![1]);
        archive.set("apple.bmp", vec![2]);
        archive.set("mango.bmp", vec![3]);

        let reopened = Archive::load(&archive.save().unwrap()).unwrap();
        assert_eq!(
            reopened.names().collect::<Vec<_>>(),
            ["zebra.bmp", "apple.bmp", "mango.bmp"]
        );
    }
}

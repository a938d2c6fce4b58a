//! The WLD document: an ordered fragment table plus its string pool.
//!
//! A WLD payload is a flat table of heterogeneous records ("fragments")
//! that reference each other by table position, forming a directed graph.
//! Forward references are legal and common, so references are never
//! resolved while parsing; they stay as integer keys and resolve lazily
//! through [`WldDoc::resolve`] once the whole table exists.

use crate::fragments::{DecodeCtx, Fragment};
use crate::string_pool::StringPool;
use crate::{Error, Result};
use pfs::ByteCursor;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Magic word at offset 0 of every WLD payload.
pub const WLD_MAGIC: u32 = 0x54503D02;

/// Version word of the original client format (16-bit mesh UVs).
pub const WLD_VERSION_OLD: u32 = 0x0001_5500;

/// Version word of the later client format (float mesh UVs).
pub const WLD_VERSION_NEW: u32 = 0x1000_C800;

/// A cross-reference to another fragment: a 1-based table index, where 0
/// means "no reference". Negative values name the target through the
/// string pool instead of by position.
///
/// References resolve lazily; a value pointing outside the table resolves
/// to absent rather than failing, since consumers must tolerate optional
/// relations anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FragmentRef(pub i32);

impl FragmentRef {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self(cursor.read_i32()?))
    }

    /// Zero-based table slot, for positive (positional) references.
    pub fn index(self) -> Option<usize> {
        if self.0 > 0 {
            Some(self.0 as usize - 1)
        } else {
            None
        }
    }

    /// String-pool offset, for negative (named) references.
    pub fn name_offset(self) -> Option<usize> {
        if self.0 < 0 {
            Some(-(self.0 as i64) as usize)
        } else {
            None
        }
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// A reference into the string pool: the negated byte offset of a
/// NUL-terminated (obfuscated) string, or 0 for unnamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StringRef(pub i32);

impl StringRef {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self(cursor.read_i32()?))
    }

    pub fn offset(self) -> Option<usize> {
        if self.0 < 0 {
            Some(-(self.0 as i64) as usize)
        } else {
            None
        }
    }

    pub fn is_none(self) -> bool {
        self.offset().is_none()
    }
}

/// Ordered, append-only fragment table. Built in one top-to-bottom decode
/// pass and read-only afterwards; safe to share between readers.
#[derive(Debug)]
pub struct WldDoc {
    /// Selects the newer wire conventions (float UVs) where layouts differ.
    pub is_new_format: bool,
    /// Declared number of BSP leaf regions; region indices in
    /// [`crate::fragments::RegionType`] stay below this.
    pub bsp_region_count: u32,
    strings: StringPool,
    fragments: Vec<Fragment>,
    by_name: HashMap<String, usize>,
    raw_count: usize,
}

impl WldDoc {
    /// Parse a complete WLD payload.
    ///
    /// Structural header problems are fatal. A single unrecognized or
    /// malformed fragment is not: it is kept as [`Fragment::Raw`] so the
    /// rest of the graph stays usable.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(bytes);

        let magic = cursor.read_u32()?;
        if magic != WLD_MAGIC {
            return Err(Error::InvalidMagic(magic));
        }
        let version = cursor.read_u32()?;
        let is_new_format = match version {
            WLD_VERSION_OLD => false,
            WLD_VERSION_NEW => true,
            other => return Err(Error::UnsupportedVersion(other)),
        };

        let fragment_count = cursor.read_u32()?;
        let bsp_region_count = cursor.read_u32()?;
        let _max_object_bytes = cursor.read_u32()?;
        let pool_len = cursor.read_u32()?;
        let _string_count = cursor.read_u32()?;

        let strings = StringPool::new(cursor.read_bytes(pool_len as usize)?.to_vec());

        debug!(
            "WLD header: {fragment_count} fragments, {bsp_region_count} regions, \
             {pool_len} byte string pool, new_format={is_new_format}"
        );

        let ctx = DecodeCtx { is_new_format };
        let mut doc = Self {
            is_new_format,
            bsp_region_count,
            strings,
            fragments: Vec::with_capacity(fragment_count as usize),
            by_name: HashMap::new(),
            raw_count: 0,
        };

        for index in 0..fragment_count as usize {
            let size = cursor.read_u32()?;
            let kind = cursor.read_u32()?;
            // Bound each decoder to its declared span; whatever it does,
            // the outer cursor lands exactly on the next record.
            let body = cursor.read_bytes(size as usize)?;
            let fragment = Self::decode_one(index, kind, body, &ctx);
            if matches!(fragment, Fragment::Raw(_)) {
                doc.raw_count += 1;
            }
            if let Some(offset) = fragment.name_ref().offset() {
                if let Some(name) = doc.strings.decoded_at(offset) {
                    doc.by_name.entry(name).or_insert(index);
                }
            }
            doc.fragments.push(fragment);
        }

        debug!(
            "parsed {} fragments ({} kept raw)",
            doc.fragments.len(),
            doc.raw_count
        );
        Ok(doc)
    }

    fn decode_one(index: usize, kind: u32, body: &[u8], ctx: &DecodeCtx) -> Fragment {
        let mut sub = ByteCursor::new(body);
        let name_ref = match StringRef::read(&mut sub) {
            Ok(r) => r,
            Err(_) => {
                warn!("fragment {index}: body shorter than its name reference");
                return Fragment::raw(kind, StringRef::default(), body.to_vec());
            }
        };

        match Fragment::decode(index, kind, name_ref, &mut sub, ctx) {
            Ok(fragment) => {
                if sub.remaining() > 0 {
                    trace!(
                        "fragment {index} (kind {kind:#04x}): {} trailing bytes",
                        sub.remaining()
                    );
                }
                fragment
            }
            Err(e) => {
                warn!("fragment {index} (kind {kind:#04x}) kept raw: {e}");
                Fragment::raw(kind, name_ref, body.to_vec())
            }
        }
    }

    pub fn strings(&self) -> &StringPool {
        &self.strings
    }

    /// Number of fragments, including raw ones.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Fragments kept opaque (unknown kind or local decode failure).
    pub fn raw_fragment_count(&self) -> usize {
        self.raw_count
    }

    /// Fragment at a zero-based table slot.
    pub fn at(&self, index: usize) -> Option<&Fragment> {
        self.fragments.get(index)
    }

    /// Resolve a cross-reference. 0, out-of-bounds positions, and unknown
    /// names all resolve to `None`.
    pub fn resolve(&self, r: FragmentRef) -> Option<&Fragment> {
        if let Some(index) = r.index() {
            return self.fragments.get(index);
        }
        let offset = r.name_offset()?;
        let name = self.strings.decoded_at(offset)?;
        self.fragment_by_name(&name)
    }

    /// Decoded name of a fragment, if it has one.
    pub fn name_of(&self, fragment: &Fragment) -> Option<String> {
        self.strings.decoded_at(fragment.name_ref().offset()?)
    }

    /// First fragment carrying the given (decoded) name.
    pub fn fragment_by_name(&self, name: &str) -> Option<&Fragment> {
        self.by_name.get(name).and_then(|&i| self.fragments.get(i))
    }

    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter()
    }

    pub fn meshes(&self) -> impl Iterator<Item = &crate::fragments::Mesh> {
        self.fragments.iter().filter_map(|f| match f {
            Fragment::Mesh(m) => Some(m),
            _ => None,
        })
    }

    pub fn materials(&self) -> impl Iterator<Item = &crate::fragments::Material> {
        self.fragments.iter().filter_map(|f| match f {
            Fragment::Material(m) => Some(m),
            _ => None,
        })
    }

    pub fn skeletons(&self) -> impl Iterator<Item = &crate::fragments::SkeletonHierarchy> {
        self.fragments.iter().filter_map(|f| match f {
            Fragment::SkeletonHierarchy(s) => Some(s),
            _ => None,
        })
    }

    pub fn object_instances(&self) -> impl Iterator<Item = &crate::fragments::ObjectInstance> {
        self.fragments.iter().filter_map(|f| match f {
            Fragment::ObjectInstance(o) => Some(o),
            _ => None,
        })
    }

    pub fn region_types(&self) -> impl Iterator<Item = &crate::fragments::RegionType> {
        self.fragments.iter().filter_map(|f| match f {
            Fragment::RegionType(r) => Some(r),
            _ => None,
        })
    }
}

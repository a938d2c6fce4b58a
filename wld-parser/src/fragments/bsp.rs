//! World partitioning fragments: the BSP tree (0x21), its leaf regions
//! (0x22), and region classifications (0x29).

use crate::doc::{FragmentRef, StringRef};
use crate::region::{self, Region};
use crate::string_pool;
use crate::{Error, Result};
use pfs::ByteCursor;

/// One node of a [`BspTree`]: a split plane with 1-based child links
/// (0 = none) and, on leaves, a region reference.
#[derive(Debug, Clone, Copy)]
pub struct BspNode {
    pub normal: [f32; 3],
    pub distance: f32,
    /// Leaf region (a 0x22 reference); 0 on interior nodes.
    pub region: FragmentRef,
    front: u32,
    back: u32,
}

impl BspNode {
    pub fn front_index(self) -> Option<usize> {
        (self.front > 0).then(|| self.front as usize - 1)
    }

    pub fn back_index(self) -> Option<usize> {
        (self.back > 0).then(|| self.back as usize - 1)
    }

    pub fn is_leaf(self) -> bool {
        self.front == 0 && self.back == 0
    }
}

/// Kind 0x21.
#[derive(Debug, Clone)]
pub struct BspTree {
    pub name_ref: StringRef,
    pub nodes: Vec<BspNode>,
}

impl BspTree {
    pub fn decode(name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let count = cursor.read_u32()?;
        let mut nodes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            nodes.push(BspNode {
                normal: [cursor.read_f32()?, cursor.read_f32()?, cursor.read_f32()?],
                distance: cursor.read_f32()?,
                region: FragmentRef::read(cursor)?,
                front: cursor.read_u32()?,
                back: cursor.read_u32()?,
            });
        }
        Ok(Self { name_ref, nodes })
    }
}

/// Kind 0x22. A leaf cell of the BSP tree. The visibility payload (which
/// other regions are visible from here) is kept opaque.
#[derive(Debug, Clone)]
pub struct BspRegion {
    pub name_ref: StringRef,
    pub flags: u32,
    pub ambient: FragmentRef,
    /// Run-length encoded visible-region set, undecoded.
    pub visibility: Vec<u8>,
    /// Region geometry; present when bit 8 of `flags` is set.
    pub mesh: Option<FragmentRef>,
}

impl BspRegion {
    const HAS_MESH: u32 = 0x100;

    pub fn decode(name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let flags = cursor.read_u32()?;
        let ambient = FragmentRef::read(cursor)?;
        let vis_len = cursor.read_u32()?;
        let visibility = cursor.read_bytes(vis_len as usize)?.to_vec();
        let mesh = if flags & Self::HAS_MESH != 0 {
            Some(FragmentRef::read(cursor)?)
        } else {
            None
        };
        Ok(Self {
            name_ref,
            flags,
            ambient,
            visibility,
            mesh,
        })
    }
}

/// Kind 0x29. Tags a set of leaf regions with a behavior (water, lava,
/// zone line, ...) encoded in an obfuscated string.
#[derive(Debug, Clone)]
pub struct RegionType {
    pub name_ref: StringRef,
    pub flags: u32,
    /// Indices of the 0x22 regions this classification covers, bounded
    /// by the document's declared region count.
    pub regions: Vec<u32>,
    /// The decoded classification string, when the fragment carries one
    /// inline; otherwise the fragment's own name is the classifier.
    pub type_string: Option<String>,
}

impl RegionType {
    pub fn decode(name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let flags = cursor.read_u32()?;
        let region_count = cursor.read_u32()?;
        let mut regions = Vec::with_capacity(region_count as usize);
        for _ in 0..region_count {
            regions.push(cursor.read_u32()?);
        }
        let str_len = cursor.read_u32()? as usize;
        let type_string = if str_len == 0 {
            None
        } else {
            let mut bytes = cursor.read_bytes(str_len)?.to_vec();
            string_pool::crypt(&mut bytes, 0);
            while bytes.last() == Some(&0) {
                bytes.pop();
            }
            Some(String::from_utf8(bytes).map_err(|_| {
                Error::InvalidString("region type string is not UTF-8".into())
            })?)
        };
        Ok(Self {
            name_ref,
            flags,
            regions,
            type_string,
        })
    }

    /// Parse the classification through the region-string grammar.
    /// `fallback_name` is the fragment's decoded name, used when no
    /// inline string is present.
    pub fn classify(&self, fallback_name: Option<&str>) -> Result<Region> {
        let s = self
            .type_string
            .as_deref()
            .or(fallback_name)
            .ok_or_else(|| Error::MalformedRegionString(String::new()))?;
        region::parse_region_string(s)
    }
}

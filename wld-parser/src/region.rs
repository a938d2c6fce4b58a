//! The region-string mini-grammar.
//!
//! Region classifications are packed into short strings with positional
//! fields rather than any delimited syntax. The leading characters pick
//! the surface behavior, the marker `ntp` at characters 2..5 flags a
//! zone line, and zone-line parameters sit at fixed character offsets
//! after that:
//!
//! ```text
//! wtntp00255000123...        chars 0..2   class prefix
//!                            chars 2..5   "ntp" zone-line marker
//!                            chars 5..10  five-digit zone id
//!                            chars 10..16 x, or a zone-point index when
//!                                         the zone id is the 255 sentinel
//!                            chars 16..22 y
//!                            chars 22..28 z
//!                            chars 28..31 heading, 512 to a full turn
//! ```

use crate::{Error, Result};

/// Surface behavior of a tagged region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionClass {
    Normal,
    Water,
    Lava,
    /// PvP-enabled ("arena") region.
    Pvp,
    /// Ice; no player traction.
    Slippery,
}

/// Where a zone-line region sends the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZonePoint {
    /// Reference into the zone's external zone-point table. Used when
    /// the zone id carries the 255 sentinel.
    Index(u32),
    /// Explicit destination.
    Absolute {
        zone_id: u32,
        position: [f32; 3],
        /// Heading in wire units, 512 to a full turn.
        heading: u32,
    },
}

/// A decoded region classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub class: RegionClass,
    pub zone_point: Option<ZonePoint>,
}

/// Zone id marking "look the destination up by index".
const ZONE_ID_SENTINEL: u32 = 255;

/// Parse a (de-obfuscated) region string.
pub fn parse_region_string(s: &str) -> Result<Region> {
    let lower = s.to_ascii_lowercase();
    let b = lower.as_bytes();

    let class = if lower.starts_with("wt") {
        RegionClass::Water
    } else if lower.starts_with("la") {
        RegionClass::Lava
    } else if lower.starts_with("sl") {
        RegionClass::Slippery
    } else if lower.starts_with("drp") || lower.starts_with("drn") {
        RegionClass::Pvp
    } else {
        RegionClass::Normal
    };

    let is_zoneline = b.len() >= 5 && &b[2..5] == b"ntp";
    if !is_zoneline {
        return Ok(Region {
            class,
            zone_point: None,
        });
    }

    let zone_id = digits_at(&lower, b, 5, 5)?;
    let zone_point = if zone_id == ZONE_ID_SENTINEL {
        ZonePoint::Index(digits_at(&lower, b, 10, 6)?)
    } else {
        ZonePoint::Absolute {
            zone_id,
            position: [
                signed_at(&lower, b, 10, 6)?,
                signed_at(&lower, b, 16, 6)?,
                signed_at(&lower, b, 22, 6)?,
            ],
            heading: digits_at(&lower, b, 28, 3)?,
        }
    };

    Ok(Region {
        class,
        zone_point: Some(zone_point),
    })
}

/// Unsigned decimal field of `len` characters at `start`.
fn digits_at(s: &str, b: &[u8], start: usize, len: usize) -> Result<u32> {
    let field = b
        .get(start..start + len)
        .ok_or_else(|| Error::MalformedRegionString(s.to_owned()))?;
    let mut value: u32 = 0;
    for &c in field {
        if !c.is_ascii_digit() {
            return Err(Error::MalformedRegionString(s.to_owned()));
        }
        value = value * 10 + u32::from(c - b'0');
    }
    Ok(value)
}

/// Signed decimal field: an optional leading `-`, digits otherwise.
fn signed_at(s: &str, b: &[u8], start: usize, len: usize) -> Result<f32> {
    let field = b
        .get(start..start + len)
        .ok_or_else(|| Error::MalformedRegionString(s.to_owned()))?;
    let (negative, digits) = match field.split_first() {
        Some((&b'-', rest)) => (true, rest),
        _ => (false, field),
    };
    let mut value: i64 = 0;
    for &c in digits {
        if !c.is_ascii_digit() {
            return Err(Error::MalformedRegionString(s.to_owned()));
        }
        value = value * 10 + i64::from(c - b'0');
    }
    if negative {
        value = -value;
    }
    Ok(value as f32)
}

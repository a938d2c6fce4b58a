//! Material fragments: surface definitions (0x30) and the per-mesh
//! material palette (0x31).

use crate::Result;
use crate::doc::{FragmentRef, StringRef};
use pfs::ByteCursor;

/// The closed set of shader behaviors a material can ask for. The wire
/// format stores a much larger code space; many codes collapse onto the
/// same behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    Diffuse,
    Transparent25,
    Transparent50,
    Transparent75,
    TransparentAdditive,
    TransparentAdditiveUnlit,
    TransparentMasked,
    DiffuseSkydome,
    TransparentSkydome,
    /// Collision-only surface, never drawn.
    Boundary,
    Invisible,
}

/// Kind 0x30.
#[derive(Debug, Clone)]
pub struct Material {
    pub name_ref: StringRef,
    pub flags: u32,
    /// Raw shader code; interpret through [`Material::shader_kind`].
    pub render_method: u32,
    /// Packed RGBA pen color.
    pub pen_rgba: u32,
    pub brightness: f32,
    pub scaled_ambient: f32,
    /// Reference to a 0x05 bitmap indirection; 0 for untextured kinds.
    pub bitmap: FragmentRef,
    /// Present when bit 1 of `flags` is set; meaning unknown.
    pub extra: Option<[f32; 2]>,
}

impl Material {
    const HAS_EXTRA: u32 = 0x02;

    pub fn decode(name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let flags = cursor.read_u32()?;
        let render_method = cursor.read_u32()?;
        let pen_rgba = cursor.read_u32()?;
        let brightness = cursor.read_f32()?;
        let scaled_ambient = cursor.read_f32()?;
        let bitmap = FragmentRef::read(cursor)?;
        let extra = if flags & Self::HAS_EXTRA != 0 {
            Some([cursor.read_f32()?, cursor.read_f32()?])
        } else {
            None
        };
        Ok(Self {
            name_ref,
            flags,
            render_method,
            pen_rgba,
            brightness,
            scaled_ambient,
            bitmap,
            extra,
        })
    }

    /// Collapse the wire shader code into the closed behavior set.
    ///
    /// Codes outside the table default to [`ShaderKind::Diffuse`], except
    /// that a material with no bitmap cannot be drawn at all and defaults
    /// to [`ShaderKind::Invisible`].
    pub fn shader_kind(&self) -> ShaderKind {
        // The high bit carries an unrelated client toggle.
        match self.render_method & 0x7FFF_FFFF {
            0x00 => ShaderKind::Boundary,
            0x05 => ShaderKind::Transparent25,
            0x09 => ShaderKind::Transparent50,
            0x0A => ShaderKind::Transparent75,
            0x0B => ShaderKind::TransparentAdditive,
            0x17 => ShaderKind::TransparentAdditiveUnlit,
            0x13 => ShaderKind::TransparentMasked,
            0x0C => ShaderKind::DiffuseSkydome,
            0x0D => ShaderKind::TransparentSkydome,
            0x01 | 0x12 | 0x14 | 0x15 | 0x19 | 0x553 => ShaderKind::Diffuse,
            _ if self.bitmap.is_none() => ShaderKind::Invisible,
            _ => ShaderKind::Diffuse,
        }
    }
}

/// Kind 0x31. An ordered palette of 0x30 references; mesh material runs
/// index into this list.
#[derive(Debug, Clone)]
pub struct MaterialList {
    pub name_ref: StringRef,
    pub flags: u32,
    pub materials: Vec<FragmentRef>,
}

impl MaterialList {
    pub fn decode(name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let flags = cursor.read_u32()?;
        let count = cursor.read_u32()?;
        let mut materials = Vec::with_capacity(count as usize);
        for _ in 0..count {
            materials.push(FragmentRef::read(cursor)?);
        }
        Ok(Self {
            name_ref,
            flags,
            materials,
        })
    }
}

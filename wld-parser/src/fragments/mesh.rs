//! Mesh fragments: the quantized triangle mesh (0x36), its indirection
//! record (0x2D), and per-vertex color tables (0x32/0x33).
//!
//! Positions are 16-bit fixed point with a per-mesh power-of-two scale;
//! normals are byte-normalized; UVs are 16-bit fixed point in old-format
//! files and floats in new-format ones.

use crate::doc::{FragmentRef, StringRef};
use crate::fragments::DecodeCtx;
use crate::{Error, Result};
use pfs::ByteCursor;

/// One triangle: three vertex indices plus a flag word. Bit 4 marks the
/// triangle as passable (no collision).
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub flags: u16,
    pub indices: [u16; 3],
}

impl Triangle {
    const PASSABLE: u16 = 0x10;

    pub fn is_solid(self) -> bool {
        self.flags & Self::PASSABLE == 0
    }
}

/// A run of consecutive vertices owned by one bone ("mob vertex piece").
#[derive(Debug, Clone, Copy)]
pub struct BoneRun {
    pub vertex_count: u16,
    pub bone: u16,
}

/// A run of consecutive triangles drawn with one palette slot.
#[derive(Debug, Clone, Copy)]
pub struct MaterialRun {
    pub triangle_count: u16,
    /// Index into the mesh's [`super::MaterialList`].
    pub material_index: u16,
}

/// Kind 0x36.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name_ref: StringRef,
    pub flags: u32,
    pub material_list: FragmentRef,
    pub center: [f32; 3],
    pub min: [f32; 3],
    pub max: [f32; 3],
    /// Vertex positions relative to `center`, already dequantized.
    pub vertices: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    /// Packed RGBA, one per vertex when present.
    pub colors: Vec<u32>,
    pub triangles: Vec<Triangle>,
    pub bone_runs: Vec<BoneRun>,
    pub material_runs: Vec<MaterialRun>,
}

impl Mesh {
    pub fn decode(
        index: usize,
        name_ref: StringRef,
        cursor: &mut ByteCursor<'_>,
        ctx: &DecodeCtx,
    ) -> Result<Self> {
        let flags = cursor.read_u32()?;
        let material_list = FragmentRef::read(cursor)?;
        let center = read_vec3(cursor)?;
        let min = read_vec3(cursor)?;
        let max = read_vec3(cursor)?;

        let vertex_count = cursor.read_u16()?;
        let uv_count = cursor.read_u16()?;
        let normal_count = cursor.read_u16()?;
        let color_count = cursor.read_u16()?;
        let triangle_count = cursor.read_u16()?;
        let bone_run_count = cursor.read_u16()?;
        let material_run_count = cursor.read_u16()?;
        let size9_count = cursor.read_u16()?;
        let raw_scale = cursor.read_u16()?;

        if raw_scale >= 32 {
            return Err(Error::BadFragment {
                index,
                kind: super::KIND_MESH,
                reason: format!("position scale exponent {raw_scale} out of range"),
            });
        }
        let scale = 2.0f32.powi(-i32::from(raw_scale));

        let mut vertices = Vec::with_capacity(vertex_count as usize);
        for _ in 0..vertex_count {
            vertices.push([
                f32::from(cursor.read_i16()?) * scale,
                f32::from(cursor.read_i16()?) * scale,
                f32::from(cursor.read_i16()?) * scale,
            ]);
        }

        let mut uvs = Vec::with_capacity(uv_count as usize);
        for _ in 0..uv_count {
            if ctx.is_new_format {
                uvs.push([cursor.read_f32()?, cursor.read_f32()?]);
            } else {
                uvs.push([
                    f32::from(cursor.read_i16()?) / 256.0,
                    f32::from(cursor.read_i16()?) / 256.0,
                ]);
            }
        }

        let mut normals = Vec::with_capacity(normal_count as usize);
        for _ in 0..normal_count {
            normals.push([
                f32::from(cursor.read_i8()?) / 128.0,
                f32::from(cursor.read_i8()?) / 128.0,
                f32::from(cursor.read_i8()?) / 128.0,
            ]);
        }

        let mut colors = Vec::with_capacity(color_count as usize);
        for _ in 0..color_count {
            colors.push(cursor.read_u32()?);
        }

        let mut triangles = Vec::with_capacity(triangle_count as usize);
        for _ in 0..triangle_count {
            triangles.push(Triangle {
                flags: cursor.read_u16()?,
                indices: [cursor.read_u16()?, cursor.read_u16()?, cursor.read_u16()?],
            });
        }

        let mut bone_runs = Vec::with_capacity(bone_run_count as usize);
        for _ in 0..bone_run_count {
            bone_runs.push(BoneRun {
                vertex_count: cursor.read_u16()?,
                bone: cursor.read_u16()?,
            });
        }

        let mut material_runs = Vec::with_capacity(material_run_count as usize);
        for _ in 0..material_run_count {
            material_runs.push(MaterialRun {
                triangle_count: cursor.read_u16()?,
                material_index: cursor.read_u16()?,
            });
        }

        // Trailing table with no known consumer; 12 bytes per entry.
        cursor.skip(u64::from(size9_count) * 12)?;

        Ok(Self {
            name_ref,
            flags,
            material_list,
            center,
            min,
            max,
            vertices,
            uvs,
            normals,
            colors,
            triangles,
            bone_runs,
            material_runs,
        })
    }

    /// Vertex positions translated by the mesh center.
    pub fn world_positions(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.vertices.iter().map(|v| {
            [
                v[0] + self.center[0],
                v[1] + self.center[1],
                v[2] + self.center[2],
            ]
        })
    }
}

fn read_vec3(cursor: &mut ByteCursor<'_>) -> Result<[f32; 3]> {
    Ok([cursor.read_f32()?, cursor.read_f32()?, cursor.read_f32()?])
}

/// Kind 0x2D. Points at a 0x36.
#[derive(Debug, Clone)]
pub struct MeshRef {
    pub name_ref: StringRef,
    pub target: FragmentRef,
    pub flags: u32,
}

impl MeshRef {
    pub fn decode(name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            name_ref,
            target: FragmentRef::read(cursor)?,
            flags: cursor.read_u32()?,
        })
    }
}

/// Kind 0x32. Per-vertex packed RGBA colors, usually baked lighting for
/// placed objects.
#[derive(Debug, Clone)]
pub struct VertexColors {
    pub name_ref: StringRef,
    pub colors: Vec<u32>,
}

impl VertexColors {
    pub fn decode(name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let count = cursor.read_u32()?;
        let mut colors = Vec::with_capacity(count as usize);
        for _ in 0..count {
            colors.push(cursor.read_u32()?);
        }
        Ok(Self { name_ref, colors })
    }
}

/// Kind 0x33. Points at a 0x32.
#[derive(Debug, Clone)]
pub struct VertexColorsRef {
    pub name_ref: StringRef,
    pub target: FragmentRef,
    pub flags: u32,
}

impl VertexColorsRef {
    pub fn decode(name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            name_ref,
            target: FragmentRef::read(cursor)?,
            flags: cursor.read_u32()?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn push_f32(out: &mut Vec<u8>, v: f32) {
        out.extend_from_slice(&v.to_le_bytes());
    }

    /// One-vertex, one-triangle mesh body (after the name reference).
    fn mesh_body(raw_scale: u16, new_format: bool) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(&0u32.to_le_bytes()); // flags
        b.extend_from_slice(&2i32.to_le_bytes()); // material list ref
        for v in [10.0f32, 20.0, 30.0] {
            push_f32(&mut b, v); // center
        }
        for _ in 0..6 {
            push_f32(&mut b, 0.0); // min, max
        }
        for count in [1u16, 1, 1, 0, 1, 1, 1, 0] {
            b.extend_from_slice(&count.to_le_bytes());
        }
        b.extend_from_slice(&raw_scale.to_le_bytes());
        // vertex (256, -256, 512)
        for v in [256i16, -256, 512] {
            b.extend_from_slice(&v.to_le_bytes());
        }
        if new_format {
            push_f32(&mut b, 0.5);
            push_f32(&mut b, 0.25);
        } else {
            for v in [128i16, 64] {
                b.extend_from_slice(&v.to_le_bytes());
            }
        }
        b.extend_from_slice(&[0i8 as u8, 0, 127]); // normal
        // triangle: passable flag, indices 0,0,0
        for v in [0x10u16, 0, 0, 0] {
            b.extend_from_slice(&v.to_le_bytes());
        }
        for v in [1u16, 3] {
            b.extend_from_slice(&v.to_le_bytes()); // bone run
        }
        for v in [1u16, 0] {
            b.extend_from_slice(&v.to_le_bytes()); // material run
        }
        b
    }

    #[test]
    fn positions_dequantize_with_the_scale_exponent() {
        let body = mesh_body(8, false);
        let mut cursor = ByteCursor::new(&body);
        let ctx = DecodeCtx {
            is_new_format: false,
        };
        let mesh = Mesh::decode(0, StringRef::default(), &mut cursor, &ctx).unwrap();

        assert_eq!(mesh.vertices, vec![[1.0, -1.0, 2.0]]);
        assert_eq!(mesh.uvs, vec![[0.5, 0.25]]);
        assert_eq!(mesh.normals[0][2], 127.0 / 128.0);
        assert!(!mesh.triangles[0].is_solid());
        assert_eq!(mesh.bone_runs[0].bone, 3);
        assert_eq!(
            mesh.world_positions().next().unwrap(),
            [11.0, 19.0, 32.0]
        );
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn new_format_reads_float_uvs() {
        let body = mesh_body(0, true);
        let mut cursor = ByteCursor::new(&body);
        let ctx = DecodeCtx {
            is_new_format: true,
        };
        let mesh = Mesh::decode(0, StringRef::default(), &mut cursor, &ctx).unwrap();
        assert_eq!(mesh.uvs, vec![[0.5, 0.25]]);
        assert_eq!(mesh.vertices, vec![[256.0, -256.0, 512.0]]);
    }

    #[test]
    fn absurd_scale_exponent_is_rejected() {
        let body = mesh_body(40, false);
        let mut cursor = ByteCursor::new(&body);
        let ctx = DecodeCtx {
            is_new_format: false,
        };
        let err = Mesh::decode(7, StringRef::default(), &mut cursor, &ctx).unwrap_err();
        assert!(matches!(err, Error::BadFragment { index: 7, .. }));
    }
}

//! Skeleton fragments: the bone hierarchy (0x10/0x11) and animation
//! tracks (0x12/0x13).
//!
//! A hierarchy is a tree drawn over a flat bone list, each bone naming
//! its children by list index. Valid input never contains a cycle or a
//! doubly-parented bone; either is rejected at decode time.

use crate::doc::{FragmentRef, StringRef};
use crate::{Error, Result};
use pfs::ByteCursor;

/// One bone of a [`SkeletonHierarchy`].
#[derive(Debug, Clone)]
pub struct Bone {
    pub name_ref: StringRef,
    pub flags: u32,
    /// Pose track (a 0x13).
    pub track: FragmentRef,
    /// Attached mesh or particle emitter, if any.
    pub attachment: FragmentRef,
    /// Child bone indices into the flat bone list.
    pub children: Vec<u32>,
}

/// Kind 0x10.
#[derive(Debug, Clone)]
pub struct SkeletonHierarchy {
    pub name_ref: StringRef,
    pub flags: u32,
    pub collision: FragmentRef,
    /// Present when bit 0 of `flags` is set.
    pub center_offset: Option<[f32; 3]>,
    /// Present when bit 1 of `flags` is set.
    pub bounding_radius: Option<f32>,
    pub bones: Vec<Bone>,
    /// Meshes animated by this skeleton; present when bit 9 of `flags`
    /// is set.
    pub meshes: Vec<FragmentRef>,
}

impl SkeletonHierarchy {
    const HAS_CENTER_OFFSET: u32 = 0x01;
    const HAS_BOUNDING_RADIUS: u32 = 0x02;
    const HAS_MESH_REFS: u32 = 0x200;

    pub fn decode(index: usize, name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let flags = cursor.read_u32()?;
        let bone_count = cursor.read_u32()?;
        let collision = FragmentRef::read(cursor)?;
        let center_offset = if flags & Self::HAS_CENTER_OFFSET != 0 {
            Some([cursor.read_f32()?, cursor.read_f32()?, cursor.read_f32()?])
        } else {
            None
        };
        let bounding_radius = if flags & Self::HAS_BOUNDING_RADIUS != 0 {
            Some(cursor.read_f32()?)
        } else {
            None
        };

        let mut bones = Vec::with_capacity(bone_count as usize);
        for _ in 0..bone_count {
            let bone_name = StringRef::read(cursor)?;
            let bone_flags = cursor.read_u32()?;
            let track = FragmentRef::read(cursor)?;
            let attachment = FragmentRef::read(cursor)?;
            let child_count = cursor.read_u32()?;
            let mut children = Vec::with_capacity(child_count as usize);
            for _ in 0..child_count {
                children.push(cursor.read_u32()?);
            }
            bones.push(Bone {
                name_ref: bone_name,
                flags: bone_flags,
                track,
                attachment,
                children,
            });
        }

        validate_bone_tree(&bones).map_err(|reason| Error::BadFragment {
            index,
            kind: super::KIND_SKELETON,
            reason,
        })?;

        let mut meshes = Vec::new();
        if flags & Self::HAS_MESH_REFS != 0 {
            let mesh_count = cursor.read_u32()?;
            meshes.reserve(mesh_count as usize);
            for _ in 0..mesh_count {
                meshes.push(FragmentRef::read(cursor)?);
            }
        }

        Ok(Self {
            name_ref,
            flags,
            collision,
            center_offset,
            bounding_radius,
            bones,
            meshes,
        })
    }
}

/// Check that the child lists form a forest: every index in range, no
/// bone with two parents, no parent chain longer than the bone count.
fn validate_bone_tree(bones: &[Bone]) -> std::result::Result<(), String> {
    let n = bones.len();
    let mut parent = vec![None::<usize>; n];
    for (i, bone) in bones.iter().enumerate() {
        for &child in &bone.children {
            let child = child as usize;
            if child >= n {
                return Err(format!("bone {i} names child {child} of {n}"));
            }
            if child == i {
                return Err(format!("bone {i} is its own child"));
            }
            if parent[child].is_some() {
                return Err(format!("bone {child} has two parents"));
            }
            parent[child] = Some(i);
        }
    }
    // A parent chain longer than n means the links loop.
    for start in 0..n {
        let mut at = start;
        for _ in 0..=n {
            match parent[at] {
                Some(up) => at = up,
                None => break,
            }
            if at == start {
                return Err(format!("bone {start} is its own ancestor"));
            }
        }
    }
    Ok(())
}

/// Kind 0x11. Points at a 0x10.
#[derive(Debug, Clone)]
pub struct SkeletonHierarchyRef {
    pub name_ref: StringRef,
    pub target: FragmentRef,
    pub flags: u32,
}

impl SkeletonHierarchyRef {
    pub fn decode(name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            name_ref,
            target: FragmentRef::read(cursor)?,
            flags: cursor.read_u32()?,
        })
    }
}

/// One reconstructed rigid transform of a [`TrackDef`] frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    pub translation: [f32; 3],
    /// Quaternion as x, y, z, w; normalized when nonzero.
    pub rotation: [f32; 4],
    pub scale: f32,
}

/// Kind 0x12. Per-frame rigid transforms stored as scaled 16-bit
/// integers, eight per frame:
/// `rot_w, rot_x, rot_y, rot_z, shift_x, shift_y, shift_z, shift_denom`.
#[derive(Debug, Clone)]
pub struct TrackDef {
    pub name_ref: StringRef,
    pub flags: u32,
    pub frames: Vec<[i16; 8]>,
}

impl TrackDef {
    pub fn decode(name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let flags = cursor.read_u32()?;
        let frame_count = cursor.read_u32()?;
        let mut frames = Vec::with_capacity(frame_count as usize);
        for _ in 0..frame_count {
            let mut frame = [0i16; 8];
            for slot in &mut frame {
                *slot = cursor.read_i16()?;
            }
            frames.push(frame);
        }
        Ok(Self {
            name_ref,
            flags,
            frames,
        })
    }

    /// Reconstruct the fixed-point transforms: translation and scale are
    /// in 1/256 units, rotation components in 1/16384 units.
    pub fn transforms(&self) -> Vec<FrameTransform> {
        self.frames
            .iter()
            .map(|&[rw, rx, ry, rz, sx, sy, sz, sd]| {
                let mut rotation = [
                    f32::from(rx) / 16384.0,
                    f32::from(ry) / 16384.0,
                    f32::from(rz) / 16384.0,
                    f32::from(rw) / 16384.0,
                ];
                let norm = rotation.iter().map(|c| c * c).sum::<f32>().sqrt();
                if norm > 0.0 {
                    for c in &mut rotation {
                        *c /= norm;
                    }
                }
                FrameTransform {
                    translation: [
                        f32::from(sx) / 256.0,
                        f32::from(sy) / 256.0,
                        f32::from(sz) / 256.0,
                    ],
                    rotation,
                    scale: f32::from(sd) / 256.0,
                }
            })
            .collect()
    }
}

/// Kind 0x13. Binds a 0x12 into a skeleton, with playback timing.
#[derive(Debug, Clone)]
pub struct Track {
    pub name_ref: StringRef,
    pub def: FragmentRef,
    pub flags: u32,
    /// Milliseconds per frame; present when bit 0 of `flags` is set.
    pub sleep_ms: Option<u32>,
}

impl Track {
    const HAS_SLEEP: u32 = 0x01;

    pub fn decode(name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let def = FragmentRef::read(cursor)?;
        let flags = cursor.read_u32()?;
        let sleep_ms = if flags & Self::HAS_SLEEP != 0 {
            Some(cursor.read_u32()?)
        } else {
            None
        };
        Ok(Self {
            name_ref,
            def,
            flags,
            sleep_ms,
        })
    }
}

//! Actor fragments: the actor definition (0x14) and its placed
//! instances (0x15).

use crate::Result;
use crate::doc::{FragmentRef, StringRef};
use pfs::ByteCursor;

/// One action entry of an [`ActorDef`]: level-of-detail switch
/// distances, nearest first.
#[derive(Debug, Clone)]
pub struct ActorAction {
    pub lod_distances: Vec<f32>,
}

/// Kind 0x14. Ties together the renderable components of one actor
/// (skeleton, mesh, or particle emitter references).
#[derive(Debug, Clone)]
pub struct ActorDef {
    pub name_ref: StringRef,
    pub flags: u32,
    /// Client-side callback name, usually `SPRITECALLBACK`.
    pub callback_name: StringRef,
    pub bounds: FragmentRef,
    pub actions: Vec<ActorAction>,
    pub components: Vec<FragmentRef>,
}

impl ActorDef {
    pub fn decode(name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let flags = cursor.read_u32()?;
        let callback_name = StringRef::read(cursor)?;
        let action_count = cursor.read_u32()?;
        let component_count = cursor.read_u32()?;
        let bounds = FragmentRef::read(cursor)?;

        let mut actions = Vec::with_capacity(action_count as usize);
        for _ in 0..action_count {
            let lod_count = cursor.read_u32()?;
            let mut lod_distances = Vec::with_capacity(lod_count as usize);
            for _ in 0..lod_count {
                lod_distances.push(cursor.read_f32()?);
            }
            actions.push(ActorAction { lod_distances });
        }

        let mut components = Vec::with_capacity(component_count as usize);
        for _ in 0..component_count {
            components.push(FragmentRef::read(cursor)?);
        }

        Ok(Self {
            name_ref,
            flags,
            callback_name,
            bounds,
            actions,
            components,
        })
    }
}

/// Kind 0x15. Places an actor in the zone. The fragment's own name
/// reference names the [`ActorDef`] being placed.
#[derive(Debug, Clone)]
pub struct ObjectInstance {
    pub name_ref: StringRef,
    pub flags: u32,
    pub sphere: FragmentRef,
    pub position: [f32; 3],
    /// Rotation in wire units, 512 to a full turn; see
    /// [`ObjectInstance::rotation_degrees`].
    pub raw_rotation: [f32; 3],
    pub scale: [f32; 3],
    /// Baked lighting (a 0x33 reference), if present.
    pub vertex_colors: FragmentRef,
}

impl ObjectInstance {
    pub fn decode(name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let flags = cursor.read_u32()?;
        let sphere = FragmentRef::read(cursor)?;
        let position = [cursor.read_f32()?, cursor.read_f32()?, cursor.read_f32()?];
        let raw_rotation = [cursor.read_f32()?, cursor.read_f32()?, cursor.read_f32()?];
        let scale = [cursor.read_f32()?, cursor.read_f32()?, cursor.read_f32()?];
        let vertex_colors = FragmentRef::read(cursor)?;
        Ok(Self {
            name_ref,
            flags,
            sphere,
            position,
            raw_rotation,
            scale,
            vertex_colors,
        })
    }

    /// Rotation converted from the client's 512-per-turn convention.
    pub fn rotation_degrees(&self) -> [f32; 3] {
        self.raw_rotation.map(|r| r / 512.0 * 360.0)
    }
}

//! Particle emitter fragment (0x34).

use crate::Result;
use crate::doc::{FragmentRef, StringRef};
use pfs::ByteCursor;

/// Kind 0x34. A particle emitter: spawn volume, rate, initial velocity,
/// tint, and the sprite drawn per particle.
#[derive(Debug, Clone)]
pub struct ParticleCloud {
    pub name_ref: StringRef,
    pub flags: u32,
    pub max_particles: u32,
    /// Raw spawn-volume selector (point, sphere, plane, ...).
    pub spawn_shape: u32,
    pub spawn_radius: f32,
    /// Particles spawned per second.
    pub spawn_rate: u32,
    pub velocity: [f32; 3],
    /// Particle lifetime in milliseconds.
    pub duration_ms: u32,
    /// Packed RGBA tint.
    pub tint: u32,
    /// Sprite reference (a 0x05).
    pub sprite: FragmentRef,
}

impl ParticleCloud {
    pub fn decode(name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            name_ref,
            flags: cursor.read_u32()?,
            max_particles: cursor.read_u32()?,
            spawn_shape: cursor.read_u32()?,
            spawn_radius: cursor.read_f32()?,
            spawn_rate: cursor.read_u32()?,
            velocity: [cursor.read_f32()?, cursor.read_f32()?, cursor.read_f32()?],
            duration_ms: cursor.read_u32()?,
            tint: cursor.read_u32()?,
            sprite: FragmentRef::read(cursor)?,
        })
    }
}

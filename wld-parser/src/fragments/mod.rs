//! Typed fragment variants and the kind dispatch.
//!
//! Each WLD record kind that the tooling understands gets a struct that
//! decodes its own body from a bounded cursor. Kinds outside this set,
//! and bodies that fail their decoder, are preserved as [`Fragment::Raw`]
//! so a single bad record never takes the document down.

mod actor;
mod bitmap;
mod bsp;
mod material;
mod mesh;
mod particle;
mod skeleton;

pub use actor::{ActorAction, ActorDef, ObjectInstance};
pub use bitmap::{BitmapInfo, BitmapInfoRef, BitmapName};
pub use bsp::{BspNode, BspRegion, BspTree, RegionType};
pub use material::{Material, MaterialList, ShaderKind};
pub use mesh::{BoneRun, MaterialRun, Mesh, MeshRef, Triangle, VertexColors, VertexColorsRef};
pub use particle::ParticleCloud;
pub use skeleton::{
    Bone, FrameTransform, SkeletonHierarchy, SkeletonHierarchyRef, Track, TrackDef,
};

use crate::Result;
use crate::doc::StringRef;
use pfs::ByteCursor;

pub const KIND_BITMAP_NAME: u32 = 0x03;
pub const KIND_BITMAP_INFO: u32 = 0x04;
pub const KIND_BITMAP_INFO_REF: u32 = 0x05;
pub const KIND_SKELETON: u32 = 0x10;
pub const KIND_SKELETON_REF: u32 = 0x11;
pub const KIND_TRACK_DEF: u32 = 0x12;
pub const KIND_TRACK: u32 = 0x13;
pub const KIND_ACTOR_DEF: u32 = 0x14;
pub const KIND_OBJECT_INSTANCE: u32 = 0x15;
pub const KIND_BSP_TREE: u32 = 0x21;
pub const KIND_BSP_REGION: u32 = 0x22;
pub const KIND_REGION_TYPE: u32 = 0x29;
pub const KIND_MESH_REF: u32 = 0x2D;
pub const KIND_MATERIAL: u32 = 0x30;
pub const KIND_MATERIAL_LIST: u32 = 0x31;
pub const KIND_VERTEX_COLORS: u32 = 0x32;
pub const KIND_VERTEX_COLORS_REF: u32 = 0x33;
pub const KIND_PARTICLE_CLOUD: u32 = 0x34;
pub const KIND_MESH: u32 = 0x36;

/// Per-document decode settings threaded into every variant decoder.
#[derive(Debug, Clone, Copy)]
pub struct DecodeCtx {
    /// New-format files store mesh UVs as floats instead of 16-bit
    /// fixed point.
    pub is_new_format: bool,
}

/// A record the dispatcher did not decode, kept verbatim.
#[derive(Debug, Clone)]
pub struct RawFragment {
    pub kind: u32,
    pub name_ref: StringRef,
    /// The complete body, name reference bytes included.
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum Fragment {
    BitmapName(BitmapName),
    BitmapInfo(BitmapInfo),
    BitmapInfoRef(BitmapInfoRef),
    SkeletonHierarchy(SkeletonHierarchy),
    SkeletonHierarchyRef(SkeletonHierarchyRef),
    TrackDef(TrackDef),
    Track(Track),
    ActorDef(ActorDef),
    ObjectInstance(ObjectInstance),
    BspTree(BspTree),
    BspRegion(BspRegion),
    RegionType(RegionType),
    MeshRef(MeshRef),
    Material(Material),
    MaterialList(MaterialList),
    VertexColors(VertexColors),
    VertexColorsRef(VertexColorsRef),
    ParticleCloud(ParticleCloud),
    Mesh(Mesh),
    Raw(RawFragment),
}

impl Fragment {
    /// Decode one body. `cursor` is already past the name reference and
    /// bounded to the record's declared span.
    pub fn decode(
        index: usize,
        kind: u32,
        name_ref: StringRef,
        cursor: &mut ByteCursor<'_>,
        ctx: &DecodeCtx,
    ) -> Result<Self> {
        Ok(match kind {
            KIND_BITMAP_NAME => Self::BitmapName(BitmapName::decode(name_ref, cursor)?),
            KIND_BITMAP_INFO => Self::BitmapInfo(BitmapInfo::decode(name_ref, cursor)?),
            KIND_BITMAP_INFO_REF => Self::BitmapInfoRef(BitmapInfoRef::decode(name_ref, cursor)?),
            KIND_SKELETON => {
                Self::SkeletonHierarchy(SkeletonHierarchy::decode(index, name_ref, cursor)?)
            }
            KIND_SKELETON_REF => {
                Self::SkeletonHierarchyRef(SkeletonHierarchyRef::decode(name_ref, cursor)?)
            }
            KIND_TRACK_DEF => Self::TrackDef(TrackDef::decode(name_ref, cursor)?),
            KIND_TRACK => Self::Track(Track::decode(name_ref, cursor)?),
            KIND_ACTOR_DEF => Self::ActorDef(ActorDef::decode(name_ref, cursor)?),
            KIND_OBJECT_INSTANCE => Self::ObjectInstance(ObjectInstance::decode(name_ref, cursor)?),
            KIND_BSP_TREE => Self::BspTree(BspTree::decode(name_ref, cursor)?),
            KIND_BSP_REGION => Self::BspRegion(BspRegion::decode(name_ref, cursor)?),
            KIND_REGION_TYPE => Self::RegionType(RegionType::decode(name_ref, cursor)?),
            KIND_MESH_REF => Self::MeshRef(MeshRef::decode(name_ref, cursor)?),
            KIND_MATERIAL => Self::Material(Material::decode(name_ref, cursor)?),
            KIND_MATERIAL_LIST => Self::MaterialList(MaterialList::decode(name_ref, cursor)?),
            KIND_VERTEX_COLORS => Self::VertexColors(VertexColors::decode(name_ref, cursor)?),
            KIND_VERTEX_COLORS_REF => {
                Self::VertexColorsRef(VertexColorsRef::decode(name_ref, cursor)?)
            }
            KIND_PARTICLE_CLOUD => Self::ParticleCloud(ParticleCloud::decode(name_ref, cursor)?),
            KIND_MESH => Self::Mesh(Mesh::decode(index, name_ref, cursor, ctx)?),
            _ => Self::raw_from(kind, name_ref, cursor),
        })
    }

    fn raw_from(kind: u32, name_ref: StringRef, cursor: &mut ByteCursor<'_>) -> Self {
        // Reconstruct the full body, name reference included.
        let mut data = name_ref.0.to_le_bytes().to_vec();
        let rest = cursor.remaining() as usize;
        if let Ok(tail) = cursor.read_bytes(rest) {
            data.extend_from_slice(tail);
        }
        Self::Raw(RawFragment {
            kind,
            name_ref,
            data,
        })
    }

    /// Build a raw fragment from an already-extracted body.
    pub fn raw(kind: u32, name_ref: StringRef, data: Vec<u8>) -> Self {
        Self::Raw(RawFragment {
            kind,
            name_ref,
            data,
        })
    }

    /// The on-disk kind word.
    pub fn kind(&self) -> u32 {
        match self {
            Self::BitmapName(_) => KIND_BITMAP_NAME,
            Self::BitmapInfo(_) => KIND_BITMAP_INFO,
            Self::BitmapInfoRef(_) => KIND_BITMAP_INFO_REF,
            Self::SkeletonHierarchy(_) => KIND_SKELETON,
            Self::SkeletonHierarchyRef(_) => KIND_SKELETON_REF,
            Self::TrackDef(_) => KIND_TRACK_DEF,
            Self::Track(_) => KIND_TRACK,
            Self::ActorDef(_) => KIND_ACTOR_DEF,
            Self::ObjectInstance(_) => KIND_OBJECT_INSTANCE,
            Self::BspTree(_) => KIND_BSP_TREE,
            Self::BspRegion(_) => KIND_BSP_REGION,
            Self::RegionType(_) => KIND_REGION_TYPE,
            Self::MeshRef(_) => KIND_MESH_REF,
            Self::Material(_) => KIND_MATERIAL,
            Self::MaterialList(_) => KIND_MATERIAL_LIST,
            Self::VertexColors(_) => KIND_VERTEX_COLORS,
            Self::VertexColorsRef(_) => KIND_VERTEX_COLORS_REF,
            Self::ParticleCloud(_) => KIND_PARTICLE_CLOUD,
            Self::Mesh(_) => KIND_MESH,
            Self::Raw(raw) => raw.kind,
        }
    }

    pub fn name_ref(&self) -> StringRef {
        match self {
            Self::BitmapName(f) => f.name_ref,
            Self::BitmapInfo(f) => f.name_ref,
            Self::BitmapInfoRef(f) => f.name_ref,
            Self::SkeletonHierarchy(f) => f.name_ref,
            Self::SkeletonHierarchyRef(f) => f.name_ref,
            Self::TrackDef(f) => f.name_ref,
            Self::Track(f) => f.name_ref,
            Self::ActorDef(f) => f.name_ref,
            Self::ObjectInstance(f) => f.name_ref,
            Self::BspTree(f) => f.name_ref,
            Self::BspRegion(f) => f.name_ref,
            Self::RegionType(f) => f.name_ref,
            Self::MeshRef(f) => f.name_ref,
            Self::Material(f) => f.name_ref,
            Self::MaterialList(f) => f.name_ref,
            Self::VertexColors(f) => f.name_ref,
            Self::VertexColorsRef(f) => f.name_ref,
            Self::ParticleCloud(f) => f.name_ref,
            Self::Mesh(f) => f.name_ref,
            Self::Raw(f) => f.name_ref,
        }
    }

    /// Human-readable variant name, for coverage reports and logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::BitmapName(_) => "BitmapName",
            Self::BitmapInfo(_) => "BitmapInfo",
            Self::BitmapInfoRef(_) => "BitmapInfoRef",
            Self::SkeletonHierarchy(_) => "SkeletonHierarchy",
            Self::SkeletonHierarchyRef(_) => "SkeletonHierarchyRef",
            Self::TrackDef(_) => "TrackDef",
            Self::Track(_) => "Track",
            Self::ActorDef(_) => "ActorDef",
            Self::ObjectInstance(_) => "ObjectInstance",
            Self::BspTree(_) => "BspTree",
            Self::BspRegion(_) => "BspRegion",
            Self::RegionType(_) => "RegionType",
            Self::MeshRef(_) => "MeshRef",
            Self::Material(_) => "Material",
            Self::MaterialList(_) => "MaterialList",
            Self::VertexColors(_) => "VertexColors",
            Self::VertexColorsRef(_) => "VertexColorsRef",
            Self::ParticleCloud(_) => "ParticleCloud",
            Self::Mesh(_) => "Mesh",
            Self::Raw(_) => "Raw",
        }
    }
}

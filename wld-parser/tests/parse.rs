//! End-to-end decode of hand-assembled WLD buffers: header handling,
//! string pool wiring, reference resolution, and bad-record tolerance.

use wld_parser::doc::{WLD_MAGIC, WLD_VERSION_NEW, WLD_VERSION_OLD};
use wld_parser::fragments;
use wld_parser::region::{RegionClass, ZonePoint};
use wld_parser::string_pool::crypt;
use wld_parser::{Error, Fragment, FragmentRef, WldDoc};

/// Assembles a WLD byte buffer the way the client expects it: header,
/// obfuscated string pool, then size/kind-framed fragment records.
struct WldBuilder {
    version: u32,
    bsp_region_count: u32,
    pool: Vec<u8>,
    fragments: Vec<(u32, Vec<u8>)>,
}

impl WldBuilder {
    fn new() -> Self {
        Self {
            version: WLD_VERSION_OLD,
            bsp_region_count: 0,
            // Offset 0 is reserved so that real strings get nonzero
            // (negatable) offsets.
            pool: vec![0],
            fragments: Vec::new(),
        }
    }

    /// Intern a string and return its name reference (negated offset).
    fn intern(&mut self, s: &str) -> i32 {
        let offset = self.pool.len() as i32;
        self.pool.extend_from_slice(s.as_bytes());
        self.pool.push(0);
        -offset
    }

    fn fragment(&mut self, kind: u32, body: Vec<u8>) -> i32 {
        self.fragments.push((kind, body));
        // 1-based reference to the record just added
        self.fragments.len() as i32
    }

    fn build(&self) -> Vec<u8> {
        let mut pool = self.pool.clone();
        crypt(&mut pool, 0);

        let mut out = Vec::new();
        out.extend_from_slice(&WLD_MAGIC.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&(self.fragments.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.bsp_region_count.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(pool.len() as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&pool);
        for (kind, body) in &self.fragments {
            out.extend_from_slice(&(body.len() as u32).to_le_bytes());
            out.extend_from_slice(&kind.to_le_bytes());
            out.extend_from_slice(body);
        }
        out
    }
}

fn body(name_ref: i32) -> Vec<u8> {
    name_ref.to_le_bytes().to_vec()
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_i32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_f32(out: &mut Vec<u8>, v: f32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn material_body(name_ref: i32, render_method: u32, bitmap: i32) -> Vec<u8> {
    let mut b = body(name_ref);
    push_u32(&mut b, 0); // flags
    push_u32(&mut b, render_method);
    push_u32(&mut b, 0); // pen
    push_f32(&mut b, 1.0);
    push_f32(&mut b, 1.0);
    push_i32(&mut b, bitmap);
    b
}

#[test]
fn decodes_a_texture_chain_end_to_end() {
    let mut w = WldBuilder::new();

    // 0x03: one obfuscated, length-prefixed file name
    let mut names = body(0);
    push_u32(&mut names, 1);
    let mut encoded = b"grass.bmp\0".to_vec();
    crypt(&mut encoded, 0);
    names.extend_from_slice(&(encoded.len() as u16).to_le_bytes());
    names.extend_from_slice(&encoded);
    let bitmap_name = w.fragment(fragments::KIND_BITMAP_NAME, names);

    // 0x04 binding the name list
    let mut info = body(0);
    push_u32(&mut info, 0); // flags
    push_u32(&mut info, 1); // frame count
    push_i32(&mut info, bitmap_name);
    let bitmap_info = w.fragment(fragments::KIND_BITMAP_INFO, info);

    // 0x05 indirection
    let mut info_ref = body(0);
    push_i32(&mut info_ref, bitmap_info);
    push_u32(&mut info_ref, 0);
    let indirection = w.fragment(fragments::KIND_BITMAP_INFO_REF, info_ref);

    // 0x30 named material pointing at the indirection
    let mat_name = w.intern("GRASS_MDF");
    w.fragment(
        fragments::KIND_MATERIAL,
        material_body(mat_name, 0x01, indirection),
    );

    let doc = WldDoc::parse(&w.build()).expect("parse");
    assert_eq!(doc.len(), 4);
    assert_eq!(doc.raw_fragment_count(), 0);
    assert!(!doc.is_new_format);

    let material = doc.materials().next().expect("material");
    assert_eq!(doc.name_of(doc.fragment_by_name("GRASS_MDF").expect("by name")), Some("GRASS_MDF".into()));

    // Walk material -> 0x05 -> 0x04 -> 0x03
    let Some(Fragment::BitmapInfoRef(r)) = doc.resolve(material.bitmap) else {
        panic!("expected a bitmap indirection");
    };
    let Some(Fragment::BitmapInfo(info)) = doc.resolve(r.target) else {
        panic!("expected bitmap info");
    };
    let Some(Fragment::BitmapName(names)) = doc.resolve(info.frames[0]) else {
        panic!("expected bitmap names");
    };
    assert_eq!(names.filenames, vec!["grass.bmp".to_owned()]);
}

#[test]
fn forward_references_resolve_after_the_full_pass() {
    let mut w = WldBuilder::new();
    // Material first, pointing at a record that only exists later
    w.fragment(fragments::KIND_MATERIAL, material_body(0, 0x01, 2));
    let mut info_ref = body(0);
    push_i32(&mut info_ref, 0);
    push_u32(&mut info_ref, 0);
    w.fragment(fragments::KIND_BITMAP_INFO_REF, info_ref);

    let doc = WldDoc::parse(&w.build()).expect("parse");
    let material = doc.materials().next().expect("material");
    assert_eq!(material.bitmap.index(), Some(1));
    assert!(matches!(
        doc.resolve(material.bitmap),
        Some(Fragment::BitmapInfoRef(_))
    ));
}

#[test]
fn absent_and_out_of_range_references_resolve_to_none() {
    let mut w = WldBuilder::new();
    w.fragment(fragments::KIND_MATERIAL, material_body(0, 0x01, 0));
    let doc = WldDoc::parse(&w.build()).expect("parse");

    assert!(doc.resolve(FragmentRef(0)).is_none());
    assert!(doc.resolve(FragmentRef(99)).is_none());
    assert!(doc.materials().next().expect("material").bitmap.is_none());
}

#[test]
fn named_references_resolve_through_the_pool() {
    let mut w = WldBuilder::new();
    let name = w.intern("TREE_ACTORDEF");
    let mut def = body(name);
    push_u32(&mut def, 0); // flags
    push_i32(&mut def, 0); // callback name
    push_u32(&mut def, 0); // actions
    push_u32(&mut def, 0); // components
    push_i32(&mut def, 0); // bounds
    w.fragment(fragments::KIND_ACTOR_DEF, def);

    let doc = WldDoc::parse(&w.build()).expect("parse");
    // A negative reference carries the target's name offset
    assert!(matches!(
        doc.resolve(FragmentRef(name)),
        Some(Fragment::ActorDef(_))
    ));
}

#[test]
fn one_bad_record_does_not_take_the_document_down() {
    let mut w = WldBuilder::new();
    w.fragment(fragments::KIND_MATERIAL, material_body(0, 0x01, 0));
    w.fragment(0xAB, vec![0, 0, 0, 0, 0xDE, 0xAD]); // unknown kind
    // Known kind with a truncated body
    w.fragment(fragments::KIND_MATERIAL, body(0));
    w.fragment(fragments::KIND_MATERIAL, material_body(0, 0x13, 0));

    let doc = WldDoc::parse(&w.build()).expect("parse");
    assert_eq!(doc.len(), 4);
    assert_eq!(doc.raw_fragment_count(), 2);
    assert_eq!(doc.materials().count(), 2);

    let Some(Fragment::Raw(raw)) = doc.at(1) else {
        panic!("expected raw fragment");
    };
    assert_eq!(raw.kind, 0xAB);
    assert_eq!(raw.data, vec![0, 0, 0, 0, 0xDE, 0xAD]);
}

#[test]
fn region_types_classify_through_the_grammar() {
    let mut w = WldBuilder::new();
    w.bsp_region_count = 8;

    let mut encoded = b"WTNTP00255000123\0".to_vec();
    crypt(&mut encoded, 0);
    let mut rt = body(0);
    push_u32(&mut rt, 0); // flags
    push_u32(&mut rt, 1); // region count
    push_u32(&mut rt, 3); // region index
    push_u32(&mut rt, encoded.len() as u32);
    rt.extend_from_slice(&encoded);
    w.fragment(fragments::KIND_REGION_TYPE, rt);

    let doc = WldDoc::parse(&w.build()).expect("parse");
    assert_eq!(doc.bsp_region_count, 8);

    let rt = doc.region_types().next().expect("region type");
    assert!(rt.regions.iter().all(|&r| r < doc.bsp_region_count));
    let region = rt.classify(None).expect("classify");
    assert_eq!(region.class, RegionClass::Water);
    assert_eq!(region.zone_point, Some(ZonePoint::Index(123)));
}

#[test]
fn new_format_flag_comes_from_the_version_word() {
    let mut w = WldBuilder::new();
    w.version = WLD_VERSION_NEW;
    let doc = WldDoc::parse(&w.build()).expect("parse");
    assert!(doc.is_new_format);
    assert!(doc.is_empty());
}

#[test]
fn bad_magic_and_unknown_versions_are_fatal() {
    let mut bytes = WldBuilder::new().build();
    bytes[0] = 0xFF;
    assert!(matches!(
        WldDoc::parse(&bytes),
        Err(Error::InvalidMagic(_))
    ));

    let mut w = WldBuilder::new();
    w.version = 0x1234_5678;
    assert!(matches!(
        WldDoc::parse(&w.build()),
        Err(Error::UnsupportedVersion(0x1234_5678))
    ));
}

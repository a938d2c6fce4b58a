//! Parser for the WLD format, the fragment-graph scene description
//! stored inside EverQuest PFS archives.
//!
//! A WLD file is a flat table of typed records ("fragments") plus one
//! shared, XOR-obfuscated string pool. Fragments reference each other by
//! 1-based table index, forming a graph: meshes point at material lists,
//! material lists at materials, materials at bitmap tables, skeletons at
//! animation tracks. [`WldDoc::parse`] decodes the whole table in one
//! pass; references stay lazy and typed accessors walk the graph.
//!
//! ```no_run
//! use wld_parser::WldDoc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let archive = pfs::Archive::load(&std::fs::read("gfaydark.s3d")?)?;
//! let bytes = archive.get("gfaydark.wld")?.unwrap_or_default();
//! let doc = WldDoc::parse(&bytes)?;
//! for mesh in doc.meshes() {
//!     println!("mesh with {} vertices", mesh.vertices.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod doc;
pub mod error;
pub mod fragments;
pub mod region;
pub mod string_pool;

pub use doc::{FragmentRef, StringRef, WldDoc};
pub use error::{Error, Result};
pub use fragments::Fragment;
pub use string_pool::StringPool;

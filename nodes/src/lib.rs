mod build;
mod check;
mod errors;
mod extract;
mod types;

pub mod util;

pub use self::build::{BspTree, BuildNode, BuildSeg, BuildSubsector, BuildVertex};
pub use self::check::verify;
pub use self::errors::{Error, ErrorKind, Result};
pub use self::extract::patch_linedefs;
pub use self::types::{Child, LevelGeometry, Linedef, LinedefId, Node, PolyobjId, SectorId, Seg,
                      SegId, SidedefId, Subsector, Vertex, VertexId, VertexRef};

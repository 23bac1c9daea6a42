use math::{BoundingBox, Fixed};

pub type VertexId = usize;
pub type SegId = usize;
pub type LinedefId = usize;
pub type SidedefId = usize;
pub type SectorId = usize;
pub type PolyobjId = usize;

/// A point of the final vertex array, in fixed-point map coordinates.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Vertex {
    pub x: Fixed,
    pub y: Fixed,
}

/// A directed boundary edge of a subsector.
///
/// A seg without a `linedef` is synthetic: either a fragment a BSP split
/// created inside a void, or a connecting seg inserted to bridge a boundary
/// gap. Connecting segs carry no sector references either.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Seg {
    pub v1: VertexId,
    pub v2: VertexId,
    pub front_sector: Option<SectorId>,
    pub back_sector: Option<SectorId>,
    pub linedef: Option<LinedefId>,
    pub sidedef: Option<SidedefId>,
    pub partner: Option<SegId>,
    pub poly_seg: bool,
}

/// A convex BSP leaf: a contiguous, cyclically closed run in the seg array.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Subsector {
    pub first_line: usize,
    pub num_lines: usize,
    pub poly: Option<PolyobjId>,
}

/// One resolved child reference of a BSP node.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Child {
    Node(usize),
    Subsector(usize),
}

/// An interior BSP node with both children resolved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Node {
    pub x: Fixed,
    pub y: Fixed,
    pub dx: Fixed,
    pub dy: Fixed,
    pub bbox: [BoundingBox; 2],
    pub children: [Child; 2],
}

/// A linedef endpoint reference. The node builder leaves endpoints pointing
/// into its own vertex list; extraction rebinds them to the final array.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VertexRef {
    Build(usize),
    Level(VertexId),
}

/// The level-side view of a linedef, the one piece of already-loaded map
/// data this stage mutates.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Linedef {
    pub v1: VertexRef,
    pub v2: VertexRef,
}

/// The flattened level geometry handed to the renderer and game logic.
#[derive(Debug)]
pub struct LevelGeometry {
    pub vertices: Vec<Vertex>,
    pub segs: Vec<Seg>,
    pub subsectors: Vec<Subsector>,
    pub nodes: Vec<Node>,
}

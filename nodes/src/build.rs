use super::types::{LinedefId, SectorId, SidedefId};
use math::{BoundingBox, Fixed};

/// A vertex of the node builder's working list. The final vertex array is an
/// index-for-index copy of this list, so builder vertex indices stay valid
/// after extraction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BuildVertex {
    pub x: Fixed,
    pub y: Fixed,
}

/// A private seg record produced by the node-building pass.
///
/// `v1`, `v2` and `partner` index the builder's own lists. A seg split off
/// inside a void has no `linedef`. `plane` names the splitting plane the seg
/// lies on and `plane_front` which side of that plane it faces.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuildSeg {
    pub v1: usize,
    pub v2: usize,
    pub linedef: Option<LinedefId>,
    pub sidedef: Option<SidedefId>,
    pub front_sector: Option<SectorId>,
    pub back_sector: Option<SectorId>,
    pub partner: Option<usize>,
    pub plane: usize,
    pub plane_front: bool,
}

/// A contiguous range into the builder's seg-index list.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BuildSubsector {
    pub first_line: usize,
    pub num_lines: usize,
}

/// An interior node whose children are still raw tagged ids; see
/// `util::parse_child_id` for the encoding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuildNode {
    pub x: Fixed,
    pub y: Fixed,
    pub dx: Fixed,
    pub dy: Fixed,
    pub bbox: [BoundingBox; 2],
    pub children: [u32; 2],
}

/// Everything the node-building pass hands over for extraction.
///
/// `seg_list` maps subsector-local positions to indices into `segs`.
/// `gl_nodes` selects the GL extraction path, which reorders and closes each
/// subsector, over the plain translation path.
#[derive(Clone, Debug)]
pub struct BspTree {
    pub vertices: Vec<BuildVertex>,
    pub segs: Vec<BuildSeg>,
    pub seg_list: Vec<usize>,
    pub subsectors: Vec<BuildSubsector>,
    pub nodes: Vec<BuildNode>,
    pub gl_nodes: bool,
}

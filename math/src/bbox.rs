use super::fixed::Fixed;

/// Axis-aligned extents of one side of a BSP partition, in fixed-point map
/// coordinates.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BoundingBox {
    pub top: Fixed,
    pub bottom: Fixed,
    pub left: Fixed,
    pub right: Fixed,
}

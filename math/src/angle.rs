use super::fixed::Fixed;
use std::f64::consts::PI;
use std::ops::Sub;

/// A binary angle measurement. The full circle spans the whole `u32` range,
/// so ordinary wrapping arithmetic implements angular differences.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Angle(pub u32);

pub const ANGLE_MAX: Angle = Angle(0xffff_ffff);

impl Sub for Angle {
    type Output = Angle;

    #[inline]
    fn sub(self, rhs: Angle) -> Angle {
        Angle(self.0.wrapping_sub(rhs.0))
    }
}

/// Converts a fixed-point direction vector to a binary angle.
pub fn point_to_angle(x: Fixed, y: Fixed) -> Angle {
    const RAD_TO_BAM: f64 = (1u64 << 30) as f64 / PI;
    let radians = f64::from(y.to_bits()).atan2(f64::from(x.to_bits()));
    // Convert to signed first; a negative double to unsigned would lose the
    // wrap-around.
    Angle(((radians * RAD_TO_BAM) as i32 as u32) << 1)
}

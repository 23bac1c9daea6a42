pub mod angle;
pub mod bbox;
pub mod fixed;

pub use self::angle::{point_to_angle, Angle, ANGLE_MAX};
pub use self::bbox::BoundingBox;
pub use self::fixed::{Fixed, FRAC_BITS, FRAC_UNIT};

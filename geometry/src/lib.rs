//! Points and vectors in the plane of the reconstruction, in millimetres.

mod point;
mod vector;

pub use point::Point;
pub use vector::{Vector, Dot};

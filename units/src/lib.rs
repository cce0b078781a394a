//! Physical quantities with millimetres as the base unit of length.
//!
//! Values cross into the numerical kernels as plain `f32`s (see [`todo`]) by
//! way of the `mm_` / `radian_` family of functions.

pub mod todo;

pub use uom;
pub use float_eq;

pub mod mmps {

  pub mod f32 {
    use uom::{ISQ, system};
    ISQ!(uom::si, f32, (millimeter, kilogram, picosecond, ampere, kelvin, mole, candela));

    /// The full circle constant (τ) Equal to 2π.
    pub const TWOPI: Angle = Angle {
        dimension: std::marker::PhantomData,
        units: std::marker::PhantomData,
        value: std::f32::consts::TAU,
    };
  }

}

pub use uom::si::Quantity;
pub use mmps::f32::{Angle, TWOPI, Length, Ratio};

mod units {
  pub use uom::si::{length::{millimeter, centimeter},
                    ratio ::ratio,
                    angle ::{radian, degree, revolution},
  };
}

// Making values from float literals seems to be very long-winded, so provide
// some pithily-named convenience constructors.

/// Generate a function called NAME which returns QUANTITY by interpreting its
/// argument as UNIT
///
/// wrap!(NAME QUANTITY UNIT);
macro_rules! wrap {
  ($name:ident $quantity:ident $unit:ident ) => {
    pub fn $name(x: f32) -> $quantity { $quantity::new::<units::$unit>(x) }
  };
}

wrap!(cm     Length  centimeter);
wrap!(mm     Length  millimeter);
wrap!(ratio  Ratio        ratio);
wrap!(radian Angle       radian);
wrap!(degree Angle       degree);
wrap!(turn   Angle   revolution);

// Reverse direction of the above.
pub fn mm_    (x: Length) -> f32 { x.get::<units::millimeter>() }
pub fn ratio_ (x: Ratio ) -> f32 { x.get::<units::ratio>() }
pub fn radian_(x: Angle ) -> f32 { x.get::<units::radian>() }
pub fn turn_  (x: Angle ) -> f32 { x.get::<units::revolution>() }

/// Compare two `uom` quantities by converting them to `f32` in the given unit.
#[macro_export]
macro_rules! assert_uom_eq {
  ($unit:ident, $lhs:expr, $rhs:expr, $algo:ident <= $tol:expr) => {
    $crate::float_eq::assert_float_eq!($lhs.get::<$unit>(), $rhs.get::<$unit>(), $algo <= $tol)
  };
}

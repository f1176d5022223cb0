//! Physical units used throughout `gtmpvc`, built on `uom`.
//!
//! Only the quantities that cross the boundary between the user and the voxel
//! grid get a real `uom` type: lengths (FWHM, voxel spacing) and ratios (kernel
//! cutoffs expressed in multiples of sigma).

pub mod todo;

pub use uom;
pub use uom::si::Quantity;
pub use uom::si::f32::{Length, Ratio};

mod units {
  pub use uom::si::{length::{micrometer, millimeter, centimeter},
                    ratio ::ratio,
  };
}

/// Generate a function called NAME which returns QUANTITY by interpreting its
/// argument as UNIT
///
/// wrap!(NAME QUANTITY UNIT);
macro_rules! wrap {
  ($name:ident $quantity:ident $unit:ident ) => {
    pub fn $name(x: f32) -> $quantity { $quantity::new::<units::$unit>(x) }
  };
}

wrap!(cm    Length  centimeter);
wrap!(mm    Length  millimeter);
wrap!(um    Length  micrometer);
wrap!(ratio Ratio        ratio);

// Reverse direction of the above
pub fn mm_   (x: Length) -> f32 { x.get::<units::millimeter>() }
pub fn ratio_(x: Ratio ) -> f32 { x.get::<units::ratio>() }

/// Convert each component of a triplet of lengths into `f32` millimetres
pub fn mm3_([x, y, z]: [Length; 3]) -> [f32; 3] { [mm_(x), mm_(y), mm_(z)] }

/// Interpret each component of a triplet of `f32`s as millimetres
pub fn mm3([x, y, z]: [f32; 3]) -> [Length; 3] { [mm(x), mm(y), mm(z)] }

#[macro_export]
macro_rules! assert_uom_eq {
  ($unit:ident, $lhs:expr, $rhs:expr, $algo:ident <= $tol:expr) => {
    float_eq::assert_float_eq!($lhs.get::<$unit>(), $rhs.get::<$unit>(), $algo <= $tol)
  };
}

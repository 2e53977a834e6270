use nalgebra::RealField;
use num_traits::ToPrimitive;

/// Trait for floating point types (f32, f64)
/// Mainly used to identify the type of the field in nalgebra
pub trait FloatingPoint: RealField + ToPrimitive + Copy {
    /// Convert a literal into the scalar type.
    /// Every `f64` literal is representable (possibly rounded) in both `f32` and `f64`.
    fn lit(value: f64) -> Self;
}

impl FloatingPoint for f32 {
    fn lit(value: f64) -> Self {
        value as f32
    }
}

impl FloatingPoint for f64 {
    fn lit(value: f64) -> Self {
        value
    }
}

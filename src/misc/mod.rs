pub mod bounding_box;
pub mod floating_point;

pub use bounding_box::*;
pub use floating_point::*;

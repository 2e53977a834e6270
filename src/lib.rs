#![allow(clippy::needless_range_loop)]

pub mod blend;
pub mod curve;
pub mod distance;
pub mod error;
pub mod knot;
pub mod misc;
pub mod structure;
pub mod surface;

pub mod prelude {
    pub use crate::blend::*;
    pub use crate::curve::*;
    pub use crate::distance::*;
    pub use crate::error::*;
    pub use crate::knot::*;
    pub use crate::misc::*;
    pub use crate::structure::*;
    pub use crate::surface::*;
}

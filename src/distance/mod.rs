pub mod graph_distance;
pub use graph_distance::*;

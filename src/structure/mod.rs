pub mod link;
pub mod part;
pub mod segment;
pub mod shape_graph;

pub use link::*;
pub use part::*;
pub use segment::*;
pub use shape_graph::*;

#[cfg(test)]
mod tests;

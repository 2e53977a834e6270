pub mod blend_options;
pub mod blend_report;
pub mod dynamic_graph;
pub mod link_matcher;
pub mod node;
pub mod observer;
pub mod topo_blender;

pub use blend_options::*;
pub use blend_report::*;
pub use dynamic_graph::*;
pub use link_matcher::*;
pub use node::*;
pub use observer::*;
pub use topo_blender::*;

#[cfg(test)]
mod tests;

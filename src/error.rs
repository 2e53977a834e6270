/// Recoverable failures raised while blending two shape graphs.
///
/// None of these abort a blend: the engine skips the affected branch or ends the
/// current phase early, and the outcome shows up as an incompletely reconciled
/// working graph in the [`BlendReport`](crate::blend::BlendReport).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlendError {
    /// A node, edge or link lookup failed.
    #[error("not found: {0}")]
    NotFound(String),
    /// A distance was queried before the distance field was built.
    #[error("distance field has not been computed")]
    NotComputed,
    /// A deficit could not be repaired because no candidate part is left.
    #[error("node `{node}` still needs {missing} link(s)")]
    Unresolvable { node: String, missing: usize },
    /// No node was available where one was expected.
    #[error("no candidate: {0}")]
    Empty(&'static str),
}

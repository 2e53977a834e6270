use std::collections::BTreeMap;

use super::DynamicGraph;

/// Outcome of a blend: the reconciled working graph and what is left unresolved
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlendReport {
    /// Final working graph
    pub graph: DynamicGraph,
    /// Anchor pair chosen by the initial correspondence, as (source, target) part ids
    pub anchor: Option<(String, String)>,
    /// Links still missing, keyed by source part id
    pub deficits: BTreeMap<String, usize>,
    /// Links cut from each node, keyed by source part id
    pub removed_links: BTreeMap<String, Vec<String>>,
    /// Source parts that never received a correspondence
    pub unmatched: Vec<String>,
    /// Number of observed steps, initial and final snapshots included
    pub steps: usize,
}

impl BlendReport {
    /// Every part matched and no link missing
    pub fn is_complete(&self) -> bool {
        self.anchor.is_some() && self.deficits.is_empty() && self.unmatched.is_empty()
    }
}

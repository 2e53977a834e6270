use std::collections::BTreeMap;

use crate::{error::BlendError, misc::FloatingPoint, structure::ShapeGraph};

use super::{NodeQuery, NodeState, SimpleEdge, SimpleNode};

/// Mutable topology mirror of a shape graph.
///
/// Nodes are addressed by their insertion index, edges by an id that is never
/// reused; removing an edge never removes a node.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DynamicGraph {
    nodes: Vec<SimpleNode>,
    edges: BTreeMap<usize, SimpleEdge>,
    next_edge_id: usize,
}

impl DynamicGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror the parts and links of a shape graph, every node asleep
    pub fn from_graph<T: FloatingPoint>(graph: &ShapeGraph<T>) -> Self {
        let mut dynamic = Self::new();
        for part in graph.nodes() {
            dynamic.add_node(part.id());
        }
        for link in graph.edges() {
            let (a, b) = link.nodes();
            if let (Some(i), Some(j)) = (
                dynamic.node_index(&NodeQuery::Original(a)),
                dynamic.node_index(&NodeQuery::Original(b)),
            ) {
                // both ends exist and differ, insertion cannot fail
                let _ = dynamic.add_edge(i, j);
            }
        }
        dynamic
    }

    pub fn nodes(&self) -> &[SimpleNode] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> Option<&SimpleNode> {
        self.nodes.get(idx)
    }

    pub fn edges(&self) -> &BTreeMap<usize, SimpleEdge> {
        &self.edges
    }

    /// Add a node mirroring the given part, returning its index
    pub fn add_node(&mut self, original: impl Into<String>) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(SimpleNode::new(idx, original.into()));
        idx
    }

    /// Connect two nodes, returning the edge id.
    /// Connecting an already connected pair returns the existing edge.
    pub fn add_edge(&mut self, i: usize, j: usize) -> Result<usize, BlendError> {
        if i >= self.nodes.len() || j >= self.nodes.len() || i == j {
            return Err(BlendError::NotFound(format!("edge endpoints ({i}, {j})")));
        }
        if let Some(id) = self.edge_id(i, j) {
            return Ok(id);
        }
        let id = self.next_edge_id;
        self.next_edge_id += 1;
        self.edges.insert(id, SimpleEdge::new(i, j));
        Ok(id)
    }

    /// Disconnect two nodes. Returns `false` when they were not connected.
    pub fn remove_edge(&mut self, i: usize, j: usize) -> bool {
        match self.edge_id(i, j) {
            Some(id) => self.edges.remove(&id).is_some(),
            None => false,
        }
    }

    pub fn has_edge(&self, i: usize, j: usize) -> bool {
        self.edge_id(i, j).is_some()
    }

    fn edge_id(&self, i: usize, j: usize) -> Option<usize> {
        self.edges
            .iter()
            .find(|(_, e)| e.connects(i, j))
            .map(|(id, _)| *id)
    }

    /// Number of edges incident to the node
    pub fn valence(&self, idx: usize) -> usize {
        self.edges.values().filter(|e| e.has_node(idx)).count()
    }

    /// Edges incident to the node keyed by edge id
    pub fn get_edges(&self, idx: usize) -> BTreeMap<usize, SimpleEdge> {
        self.edges
            .iter()
            .filter(|(_, e)| e.has_node(idx))
            .map(|(id, e)| (*id, *e))
            .collect()
    }

    /// Indices of the nodes adjacent to the node, ordered by edge id
    pub fn neighbors(&self, idx: usize) -> Vec<usize> {
        self.edges
            .values()
            .filter(|e| e.has_node(idx))
            .map(|e| e.other_node(idx))
            .collect()
    }

    /// First node matching the query
    pub fn node_index(&self, query: &NodeQuery<'_>) -> Option<usize> {
        self.nodes.iter().position(|n| n.matches(query))
    }

    /// Every node matching the query, in index order
    pub fn nodes_with(&self, query: &NodeQuery<'_>) -> Vec<usize> {
        self.nodes
            .iter()
            .filter(|n| n.matches(query))
            .map(|n| n.idx())
            .collect()
    }

    /// State of every node in index order
    pub fn flags(&self) -> Vec<NodeState> {
        self.nodes.iter().map(|n| n.state()).collect()
    }

    pub fn count(&self, state: NodeState) -> usize {
        self.nodes.iter().filter(|n| n.state() == state).count()
    }

    /// Set every node to the given state
    pub fn flag_nodes(&mut self, state: NodeState) {
        self.nodes.iter_mut().for_each(|n| n.set_state(state));
    }

    pub fn set_state(&mut self, idx: usize, state: NodeState) -> Result<(), BlendError> {
        self.node_mut(idx)?.set_state(state);
        Ok(())
    }

    pub fn set_correspond(&mut self, idx: usize, id: impl Into<String>) -> Result<(), BlendError> {
        self.node_mut(idx)?.set_correspond(id.into());
        Ok(())
    }

    fn node_mut(&mut self, idx: usize) -> Result<&mut SimpleNode, BlendError> {
        self.nodes
            .get_mut(idx)
            .ok_or_else(|| BlendError::NotFound(format!("node {idx}")))
    }
}

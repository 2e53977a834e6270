use std::fmt;

/// Traversal status of a working graph node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeState {
    Sleep,
    Active,
    Done,
    Disconnected,
}

impl NodeState {
    pub const ALL: [NodeState; 4] = [
        NodeState::Sleep,
        NodeState::Active,
        NodeState::Done,
        NodeState::Disconnected,
    ];
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeState::Sleep => "SLEEP",
            NodeState::Active => "ACTIVE",
            NodeState::Done => "DONE",
            NodeState::Disconnected => "DISCONNECTED",
        };
        f.write_str(name)
    }
}

/// A node of the working graph mirroring one part of a shape graph
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpleNode {
    idx: usize,
    original: String,
    state: NodeState,
    correspond: Option<String>,
}

impl SimpleNode {
    pub(crate) fn new(idx: usize, original: String) -> Self {
        Self {
            idx,
            original,
            state: NodeState::Sleep,
            correspond: None,
        }
    }

    pub fn idx(&self) -> usize {
        self.idx
    }

    /// Id of the mirrored part
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Id of the part of the other graph assigned to this node
    pub fn correspond(&self) -> Option<&str> {
        self.correspond.as_deref()
    }

    pub(crate) fn set_state(&mut self, state: NodeState) {
        self.state = state;
    }

    pub(crate) fn set_correspond(&mut self, id: String) {
        self.correspond = Some(id);
    }

    pub fn matches(&self, query: &NodeQuery<'_>) -> bool {
        match query {
            NodeQuery::State(state) => self.state == *state,
            NodeQuery::Original(id) => self.original == *id,
            NodeQuery::Correspond(id) => self.correspond.as_deref() == Some(*id),
        }
    }
}

/// An undirected edge between two working graph nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpleEdge {
    n: [usize; 2],
}

impl SimpleEdge {
    pub fn new(a: usize, b: usize) -> Self {
        Self { n: [a, b] }
    }

    pub fn nodes(&self) -> [usize; 2] {
        self.n
    }

    pub fn has_node(&self, idx: usize) -> bool {
        self.n.contains(&idx)
    }

    pub fn connects(&self, a: usize, b: usize) -> bool {
        self.n == [a, b] || self.n == [b, a]
    }

    /// The node on the other end of the edge
    pub fn other_node(&self, idx: usize) -> usize {
        if self.n[0] == idx {
            self.n[1]
        } else {
            self.n[0]
        }
    }
}

/// Attribute lookup over working graph nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeQuery<'a> {
    State(NodeState),
    Original(&'a str),
    Correspond(&'a str),
}

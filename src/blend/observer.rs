use std::fmt;

use super::DynamicGraph;

/// What happened during one step of a blend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlendEvent {
    /// The anchor pair has been chosen
    Initial { source: String, target: String },
    /// Surplus links of a node have been cut
    RemovedLinks { node: String, links: Vec<String> },
    /// A node has fewer links than its counterpart
    NeedLinks { node: String, missing: usize },
    SameLinkCount { node: String },
    /// A node could not be reconciled and was closed as is
    Skipped { node: String, reason: String },
    /// A disconnected part has been attached to a node lacking links
    Reconnected { node: String, with: String },
    /// A link known from the target has been added between two matched nodes
    EdgeFilled { node: String, with: String },
    Final,
}

impl fmt::Display for BlendEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlendEvent::Initial { source, target } => {
                write!(f, "Initial graph, [{source}] corresponds to [{target}]")
            }
            BlendEvent::RemovedLinks { node, links } => {
                write!(f, "Removed links {} from node [{node}]", links.join(", "))
            }
            BlendEvent::NeedLinks { node, missing } => {
                write!(f, "Need to add {missing} link(s) to node [{node}]")
            }
            BlendEvent::SameLinkCount { node } => write!(f, "Same links count on node [{node}]"),
            BlendEvent::Skipped { node, reason } => write!(f, "Skipped node [{node}]: {reason}"),
            BlendEvent::Reconnected { node, with } | BlendEvent::EdgeFilled { node, with } => {
                write!(f, "connected node [{node}] with [{with}]")
            }
            BlendEvent::Final => f.write_str("Final graph"),
        }
    }
}

/// Receives a snapshot of the working graph after every blend step.
///
/// Observers only watch: the blend result does not depend on whether one is attached.
pub trait BlendObserver {
    fn on_step(&mut self, step: usize, graph: &DynamicGraph, event: &BlendEvent);
}

/// Observer ignoring every step
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObserver;

impl BlendObserver for NoObserver {
    fn on_step(&mut self, _step: usize, _graph: &DynamicGraph, _event: &BlendEvent) {}
}

impl<F> BlendObserver for F
where
    F: FnMut(usize, &DynamicGraph, &BlendEvent),
{
    fn on_step(&mut self, step: usize, graph: &DynamicGraph, event: &BlendEvent) {
        self(step, graph, event)
    }
}

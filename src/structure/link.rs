use nalgebra::Vector4;

use crate::misc::FloatingPoint;

/// An edge of a shape graph connecting two parts.
/// Each endpoint carries the ordered coordinates where the link attaches to that part.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Link<T: FloatingPoint> {
    id: String,
    nodes: [String; 2],
    coords: [Vec<Vector4<T>>; 2],
}

impl<T: FloatingPoint> Link<T> {
    /// Create a new link
    /// # Failures
    /// - if both endpoints are the same part
    /// - if an endpoint has no attachment coordinate
    pub fn try_new(
        n1: impl Into<String>,
        n2: impl Into<String>,
        coord1: Vec<Vector4<T>>,
        coord2: Vec<Vector4<T>>,
    ) -> anyhow::Result<Self> {
        let (n1, n2) = (n1.into(), n2.into());
        anyhow::ensure!(n1 != n2, "Link endpoints must differ, got `{}` twice", n1);
        anyhow::ensure!(
            !coord1.is_empty() && !coord2.is_empty(),
            "Link `{}:{}` needs at least one coordinate per endpoint",
            n1,
            n2
        );
        Ok(Self {
            id: link_name(&n1, &n2),
            nodes: [n1, n2],
            coords: [coord1, coord2],
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn nodes(&self) -> (&str, &str) {
        (&self.nodes[0], &self.nodes[1])
    }

    pub fn has_node(&self, node_id: &str) -> bool {
        self.nodes.iter().any(|n| n == node_id)
    }

    /// Check if the link joins the two parts, in either orientation
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.nodes[0] == a && self.nodes[1] == b) || (self.nodes[0] == b && self.nodes[1] == a)
    }

    /// The part on the other end of the link
    pub fn other_node(&self, node_id: &str) -> Option<&str> {
        self.endpoint(node_id).map(|i| self.nodes[1 - i].as_str())
    }

    /// All attachment coordinates on the given part
    pub fn coords_of(&self, node_id: &str) -> Option<&[Vector4<T>]> {
        self.endpoint(node_id).map(|i| self.coords[i].as_slice())
    }

    /// The leading attachment coordinate on the given part
    pub fn coord_of(&self, node_id: &str) -> Option<Vector4<T>> {
        self.coords_of(node_id).and_then(|c| c.first().copied())
    }

    fn endpoint(&self, node_id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n == node_id)
    }
}

/// Name of the link between two parts
pub fn link_name(n1: &str, n2: &str) -> String {
    format!("{n1}:{n2}")
}

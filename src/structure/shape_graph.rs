use nalgebra::{DMatrix, Point3, Vector4};

use crate::{
    error::BlendError,
    misc::{BoundingBox, FloatingPoint},
};

use super::{link_name, Link, Part, Segment};

/// Attachment coordinates of one link at one of its endpoints
#[derive(Clone, Copy, Debug)]
pub struct LinkCoordinates<'a, T: FloatingPoint> {
    pub link: &'a Link<T>,
    pub coords: &'a [Vector4<T>],
}

impl<T: FloatingPoint> LinkCoordinates<'_, T> {
    /// The leading attachment coordinate
    pub fn coord(&self) -> Vector4<T> {
        self.coords.first().copied().unwrap_or_else(Vector4::zeros)
    }
}

/// A segmented shape: parts as nodes, links as edges
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShapeGraph<T: FloatingPoint> {
    nodes: Vec<Part<T>>,
    edges: Vec<Link<T>>,
}

impl<T: FloatingPoint> ShapeGraph<T> {
    pub fn new() -> Self {
        Self {
            nodes: vec![],
            edges: vec![],
        }
    }

    pub fn nodes(&self) -> &[Part<T>] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Link<T>] {
        &self.edges
    }

    /// Add a part and return its index
    pub fn add_node(&mut self, part: Part<T>) -> anyhow::Result<usize> {
        anyhow::ensure!(
            self.node_index(part.id()).is_none(),
            "Duplicate part id `{}`",
            part.id()
        );
        self.nodes.push(part);
        Ok(self.nodes.len() - 1)
    }

    /// Link two existing parts and return the link index.
    /// An existing link between the two parts is kept as is.
    pub fn add_edge(
        &mut self,
        n1: &str,
        n2: &str,
        coord1: Vec<Vector4<T>>,
        coord2: Vec<Vector4<T>>,
    ) -> anyhow::Result<usize> {
        anyhow::ensure!(self.node_index(n1).is_some(), "Unknown part `{}`", n1);
        anyhow::ensure!(self.node_index(n2).is_some(), "Unknown part `{}`", n2);
        if let Some(i) = self.edges.iter().position(|l| l.connects(n1, n2)) {
            return Ok(i);
        }
        self.edges.push(Link::try_new(n1, n2, coord1, coord2)?);
        Ok(self.edges.len() - 1)
    }

    /// Remove the link between two parts, returning it if present
    pub fn remove_edge(&mut self, n1: &str, n2: &str) -> Option<Link<T>> {
        let i = self.edges.iter().position(|l| l.connects(n1, n2))?;
        Some(self.edges.remove(i))
    }

    pub fn node_index(&self, node_id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id() == node_id)
    }

    pub fn get_node(&self, node_id: &str) -> Result<&Part<T>, BlendError> {
        self.nodes
            .iter()
            .find(|n| n.id() == node_id)
            .ok_or_else(|| BlendError::NotFound(format!("part `{node_id}`")))
    }

    /// The link between two parts, in either orientation
    pub fn get_edge(&self, id1: &str, id2: &str) -> Option<&Link<T>> {
        self.edges.iter().find(|l| l.connects(id1, id2))
    }

    /// The link joining two parts of this graph
    pub fn original_link(&self, id1: &str, id2: &str) -> Result<&Link<T>, BlendError> {
        self.get_edge(id1, id2)
            .ok_or_else(|| BlendError::NotFound(format!("link `{}`", link_name(id1, id2))))
    }

    /// Every link incident to the part, in insertion order
    pub fn get_edges(&self, node_id: &str) -> Vec<&Link<T>> {
        self.edges.iter().filter(|l| l.has_node(node_id)).collect()
    }

    pub fn valence(&self, node_id: &str) -> usize {
        self.edges.iter().filter(|l| l.has_node(node_id)).count()
    }

    /// Attachment coordinates of every incident link at the given part
    pub fn links_coords(&self, node_id: &str) -> Vec<LinkCoordinates<'_, T>> {
        self.edges
            .iter()
            .filter_map(|link| {
                link.coords_of(node_id)
                    .map(|coords| LinkCoordinates { link, coords })
            })
            .collect()
    }

    /// Position of a coordinate on the given part
    pub fn position(&self, node_id: &str, coord: &Vector4<T>) -> Result<Point3<T>, BlendError> {
        self.get_node(node_id).map(|n| n.position(coord))
    }

    /// Bounding box over a coarse sampling of every part
    pub fn bbox(&self) -> Option<BoundingBox<T>> {
        let points = self
            .nodes
            .iter()
            .flat_map(|n| n.discretize(T::default_epsilon(), 16).points);
        BoundingBox::new_with_points(points)
    }

    /// The part with the largest area
    pub fn root_by_size(&self) -> Option<&Part<T>> {
        self.nodes.iter().fold(None, |best: Option<&Part<T>>, n| match best {
            Some(b) if b.area() >= n.area() => Some(b),
            _ => Some(n),
        })
    }

    /// The part with the most links, ties broken by insertion order
    pub fn root_by_valence(&self) -> Option<&Part<T>> {
        self.nodes.iter().fold(None, |best: Option<&Part<T>>, n| match best {
            Some(b) if self.valence(b.id()) >= self.valence(n.id()) => Some(b),
            _ => Some(n),
        })
    }

    /// Symmetric 0/1 adjacency matrix indexed by node insertion order
    pub fn adjacency(&self) -> DMatrix<T> {
        let n = self.nodes.len();
        let mut adjacency = DMatrix::zeros(n, n);
        for link in self.edges.iter() {
            let (a, b) = link.nodes();
            if let (Some(i), Some(j)) = (self.node_index(a), self.node_index(b)) {
                adjacency[(i, j)] = T::one();
                adjacency[(j, i)] = T::one();
            }
        }
        adjacency
    }
}

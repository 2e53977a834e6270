use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3, Vector4};

use super::*;
use crate::{curve::NurbsCurve, error::BlendError, surface::NurbsSurface};

fn segment(id: &str, from: [f64; 3], to: [f64; 3]) -> Part<f64> {
    Part::curve(
        id,
        NurbsCurve::try_polyline(&[Point3::from(from), Point3::from(to)]).unwrap(),
    )
}

fn coord(u: f64) -> Vec<Vector4<f64>> {
    vec![Vector4::new(u, 0.0, 0.0, 0.0)]
}

/// A chair-like graph: a seat sheet with two legs and a back
fn chair() -> ShapeGraph<f64> {
    let mut graph = ShapeGraph::new();
    graph
        .add_node(Part::sheet(
            "seat",
            NurbsSurface::plane(Point3::origin(), Vector3::x(), Vector3::y()),
        ))
        .unwrap();
    graph
        .add_node(segment("leg0", [0.0, 0.0, 0.0], [0.0, 0.0, -1.0]))
        .unwrap();
    graph
        .add_node(segment("leg1", [1.0, 0.0, 0.0], [1.0, 0.0, -1.0]))
        .unwrap();
    graph
        .add_node(segment("back", [0.0, 1.0, 0.0], [0.0, 1.0, 2.0]))
        .unwrap();
    graph
        .add_edge("seat", "leg0", coord(0.0), coord(0.0))
        .unwrap();
    graph
        .add_edge("seat", "leg1", coord(1.0), coord(0.0))
        .unwrap();
    graph
        .add_edge(
            "back",
            "seat",
            coord(0.0),
            vec![Vector4::new(0.0, 1.0, 0.0, 0.0)],
        )
        .unwrap();
    graph
}

#[test]
fn graph_queries() {
    let graph = chair();
    assert_eq!(graph.nodes().len(), 4);
    assert_eq!(graph.edges().len(), 3);
    assert_eq!(graph.valence("seat"), 3);
    assert_eq!(graph.valence("leg0"), 1);
    assert_eq!(graph.get_edges("seat").len(), 3);
    assert!(graph.get_edge("leg1", "seat").is_some());
    assert!(graph.get_edge("leg0", "leg1").is_none());

    let coords = graph.links_coords("seat");
    assert_eq!(coords.len(), 3);
    assert_eq!(coords[2].link.other_node("seat"), Some("back"));
    assert_eq!(coords[2].coord(), Vector4::new(0.0, 1.0, 0.0, 0.0));

    let position = graph
        .position("seat", &coords[2].coord())
        .unwrap();
    assert_relative_eq!(position, Point3::new(0.0, 1.0, 0.0));
}

#[test]
fn missing_lookups_fail_with_not_found() {
    let graph = chair();
    assert!(matches!(
        graph.original_link("leg0", "back"),
        Err(BlendError::NotFound(_))
    ));
    assert!(matches!(graph.get_node("arm"), Err(BlendError::NotFound(_))));
    assert!(graph.position("arm", &Vector4::zeros()).is_err());
}

#[test]
fn graph_mutation() {
    let mut graph = chair();
    assert!(graph.add_node(segment("leg0", [0.0; 3], [1.0; 3])).is_err());
    assert!(graph.add_edge("seat", "arm", coord(0.0), coord(0.0)).is_err());

    // linking an already linked pair keeps the first link
    let before = graph.edges().len();
    let index = graph
        .add_edge("leg0", "seat", coord(0.5), coord(0.5))
        .unwrap();
    assert_eq!(index, 0);
    assert_eq!(graph.edges().len(), before);

    let removed = graph.remove_edge("leg1", "seat").unwrap();
    assert_eq!(removed.id(), "seat:leg1");
    assert_eq!(graph.valence("leg1"), 0);
    assert_eq!(graph.nodes().len(), 4);
    assert!(graph.remove_edge("leg1", "seat").is_none());
}

#[test]
fn graph_analysis() {
    let graph = chair();
    // back has length 2, the seat has area 1
    assert_eq!(graph.root_by_size().map(|p| p.id()), Some("back"));
    assert_eq!(graph.root_by_valence().map(|p| p.id()), Some("seat"));

    let bbox = graph.bbox().unwrap();
    assert_relative_eq!(*bbox.min(), Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-12);
    assert_relative_eq!(*bbox.max(), Vector3::new(1.0, 1.0, 2.0), epsilon = 1e-12);

    let adjacency = graph.adjacency();
    assert_eq!(adjacency.nrows(), 4);
    assert_eq!(adjacency, adjacency.transpose());
    assert_eq!(adjacency[(0, 1)], 1.0);
    assert_eq!(adjacency[(1, 2)], 0.0);
    assert_eq!(adjacency.sum(), 6.0);
}

#[test]
fn empty_graph_has_no_roots() {
    let graph = ShapeGraph::<f64>::new();
    assert!(graph.root_by_size().is_none());
    assert!(graph.root_by_valence().is_none());
    assert!(graph.bbox().is_none());
}

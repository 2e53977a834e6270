use nalgebra::{Point3, Vector3, Vector4};
use topo_blend::prelude::*;

fn bar(id: &str, from: [f64; 3], to: [f64; 3]) -> Part<f64> {
    Part::curve(
        id,
        NurbsCurve::try_polyline(&[Point3::from(from), Point3::from(to)]).unwrap(),
    )
}

fn seat() -> Part<f64> {
    Part::sheet(
        "seat",
        NurbsSurface::plane(Point3::origin(), Vector3::x() * 2.0, Vector3::y() * 2.0),
    )
}

fn uv(u: f64, v: f64) -> Vec<Vector4<f64>> {
    vec![Vector4::new(u, v, 0.0, 0.0)]
}

/// A square seat on two front legs with a back rising from its rear edge
pub fn chair() -> ShapeGraph<f64> {
    let mut graph = ShapeGraph::new();
    graph.add_node(seat()).unwrap();
    graph
        .add_node(bar("leg0", [0.0, 0.0, 0.0], [0.0, 0.0, -1.0]))
        .unwrap();
    graph
        .add_node(bar("leg1", [2.0, 0.0, 0.0], [2.0, 0.0, -1.0]))
        .unwrap();
    graph
        .add_node(bar("back", [0.0, 2.0, 0.0], [0.0, 2.0, 2.0]))
        .unwrap();
    graph
        .add_edge("seat", "leg0", uv(0.0, 0.0), uv(0.0, 0.0))
        .unwrap();
    graph
        .add_edge("seat", "leg1", uv(1.0, 0.0), uv(0.0, 0.0))
        .unwrap();
    graph
        .add_edge("seat", "back", uv(0.0, 1.0), uv(0.0, 0.0))
        .unwrap();
    graph
}

/// The same seat on four legs, one at each corner
pub fn stool() -> ShapeGraph<f64> {
    let mut graph = ShapeGraph::new();
    graph.add_node(seat()).unwrap();
    let corners = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)];
    for (i, (u, v)) in corners.into_iter().enumerate() {
        let id = format!("s{i}");
        let (x, y) = (2.0 * u, 2.0 * v);
        graph.add_node(bar(&id, [x, y, 0.0], [x, y, -1.0])).unwrap();
        graph.add_edge("seat", &id, uv(u, v), uv(0.0, 0.0)).unwrap();
    }
    graph
}

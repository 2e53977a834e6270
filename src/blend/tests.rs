use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3, Vector4};
use proptest::prelude::*;

use super::*;
use crate::{
    curve::NurbsCurve,
    error::BlendError,
    structure::{Part, ShapeGraph},
    surface::NurbsSurface,
};

fn bar(id: &str, from: [f64; 3], to: [f64; 3]) -> Part<f64> {
    Part::curve(
        id,
        NurbsCurve::try_polyline(&[Point3::from(from), Point3::from(to)]).unwrap(),
    )
}

fn coord(u: f64) -> Vec<Vector4<f64>> {
    vec![Vector4::new(u, 0.0, 0.0, 0.0)]
}

/// A hub bar of length 4 along x with vertical legs attached at the given parameters
pub(super) fn star(hub: &str, legs: &[(&str, f64)]) -> ShapeGraph<f64> {
    let mut graph = ShapeGraph::new();
    graph.add_node(bar(hub, [0.0, 0.0, 0.0], [4.0, 0.0, 0.0])).unwrap();
    for (leg, u) in legs {
        let x = 4.0 * u;
        graph.add_node(bar(leg, [x, 0.0, 0.0], [x, 1.0, 0.0])).unwrap();
        graph.add_edge(hub, leg, coord(*u), coord(0.0)).unwrap();
    }
    graph
}

pub(super) fn index(graph: &DynamicGraph, id: &str) -> usize {
    graph.node_index(&NodeQuery::Original(id)).unwrap()
}

pub(super) fn state(graph: &DynamicGraph, id: &str) -> NodeState {
    graph.node(index(graph, id)).unwrap().state()
}

#[test]
fn single_part_blend() {
    let mut source = ShapeGraph::new();
    source.add_node(bar("a", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0])).unwrap();
    let mut target = ShapeGraph::new();
    target.add_node(bar("b", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0])).unwrap();

    let mut blender = TopoBlender::new(&source, &target);
    let scores = blender.score_pairs();
    assert_eq!(scores.len(), 1);
    assert_relative_eq!(scores[0].score, 1.0, epsilon = 1e-6);

    let report = blender.blend();
    assert_eq!(report.anchor, Some(("a".to_string(), "b".to_string())));
    assert_eq!(report.graph.flags(), vec![NodeState::Done]);
    assert_eq!(report.graph.nodes()[0].correspond(), Some("b"));
    assert!(report.deficits.is_empty());
    assert!(report.is_complete());
    // initial, same link count, final
    assert_eq!(report.steps, 3);
}

#[test]
fn mismatched_types_never_correspond() {
    let mut source = ShapeGraph::new();
    source.add_node(bar("a", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0])).unwrap();
    let mut target = ShapeGraph::new();
    target
        .add_node(Part::sheet(
            "b",
            NurbsSurface::plane(Point3::origin(), Vector3::x(), Vector3::y()),
        ))
        .unwrap();

    let mut blender = TopoBlender::new(&source, &target);
    assert!(blender.score_pairs().is_empty());
    assert!(matches!(
        blender.best_partial_correspondence(),
        Err(BlendError::Empty(_))
    ));

    let report = blender.blend();
    assert!(report.anchor.is_none());
    assert!(!report.is_complete());
    assert_eq!(report.unmatched, vec!["a".to_string()]);
    assert_eq!(report.steps, 1);
}

#[test]
fn surplus_links_are_cut() {
    let source = star("s", &[("l0", 0.0), ("l1", 0.5), ("l2", 1.0)]);
    let target = star("t", &[("m0", 0.0)]);

    let mut snapshots = vec![];
    let mut observer = |_: usize, graph: &DynamicGraph, event: &BlendEvent| {
        if matches!(event, BlendEvent::RemovedLinks { .. }) {
            snapshots.push(graph.clone());
        }
    };
    let report = TopoBlender::new(&source, &target).blend_with_observer(&mut observer);

    assert_eq!(snapshots.len(), 1);
    let cut = &snapshots[0];
    assert_eq!(cut.edges().len(), 1);
    assert_eq!(state(cut, "l0"), NodeState::Active);
    assert_eq!(state(cut, "l1"), NodeState::Disconnected);
    assert_eq!(state(cut, "l2"), NodeState::Disconnected);

    assert_eq!(
        report.removed_links.get("s"),
        Some(&vec!["s:l2".to_string(), "s:l1".to_string()])
    );
    let graph = &report.graph;
    assert_eq!(graph.count(NodeState::Done), 2);
    assert_eq!(graph.count(NodeState::Disconnected), 2);
    assert_eq!(graph.nodes()[index(graph, "l0")].correspond(), Some("m0"));
    assert_eq!(report.unmatched, vec!["l1".to_string(), "l2".to_string()]);
    assert!(report.deficits.is_empty());
}

#[test]
fn missing_links_stay_unresolved_without_disconnected_parts() {
    let source = star("s", &[("l0", 0.0)]);
    let target = star("t", &[("m0", 0.0), ("m1", 0.5), ("m2", 1.0)]);

    let mut blender = TopoBlender::new(&source, &target);
    blender.best_partial_correspondence().unwrap();
    let mut lacking = vec![];
    let mut observer = |_: usize, graph: &DynamicGraph, event: &BlendEvent| {
        if let BlendEvent::NeedLinks { node, missing } = event {
            lacking.push((node.clone(), *missing, graph.clone()));
        }
    };
    assert_eq!(blender.reconcile_links(&mut observer), 2);

    assert_eq!(lacking.len(), 1);
    let (node, missing, graph) = &lacking[0];
    assert_eq!((node.as_str(), *missing), ("s", 2));
    assert_eq!(state(graph, "l0"), NodeState::Active);
    assert_eq!(graph.nodes()[index(graph, "l0")].correspond(), Some("m0"));

    let s = index(blender.active(), "s");
    assert_eq!(blender.deficits().get(&s), Some(&2));
    assert_eq!(blender.active().edges().len(), 1);

    let before = blender.active().clone();
    assert_eq!(blender.repair_deficits(&mut NoObserver), 0);
    assert_eq!(blender.active(), &before);
    assert_eq!(blender.deficits().get(&s), Some(&2));

    let report = blender.blend();
    assert_eq!(report.deficits.get("s"), Some(&2));
    assert!(report.removed_links.is_empty());
    assert!(report.unmatched.is_empty());
    assert!(!report.is_complete());
}

#[test]
fn equal_link_counts_leave_neighbors_asleep() {
    let source = star("s", &[("a", 0.0)]);
    let target = star("t", &[("m", 0.0)]);

    let mut events = vec![];
    let mut observer = |_: usize, _: &DynamicGraph, event: &BlendEvent| {
        events.push(event.clone());
    };
    let report = TopoBlender::new(&source, &target).blend_with_observer(&mut observer);

    assert_eq!(report.anchor, Some(("s".to_string(), "t".to_string())));
    assert_eq!(
        events[1],
        BlendEvent::SameLinkCount {
            node: "s".to_string()
        }
    );
    let graph = &report.graph;
    assert_eq!(state(graph, "s"), NodeState::Done);
    assert_eq!(state(graph, "a"), NodeState::Sleep);
    assert_eq!(graph.nodes()[index(graph, "a")].correspond(), None);
    assert_eq!(graph.edges().len(), 1);
    assert_eq!(report.unmatched, vec!["a".to_string()]);
    assert!(!report.is_complete());
}

#[test]
fn every_missing_connection_is_repaired() {
    // both legs of the source hub pick the same target leg, so the hub lacks one link
    // while two of its target neighbors stay unmatched
    let mut source = star("s", &[("a", 0.0), ("b", 0.1)]);
    source.add_node(bar("x", [0.0, 1.0, 0.0], [1.0, 1.0, 0.0])).unwrap();
    source.add_node(bar("y", [0.0, 1.0, 0.0], [-1.0, 1.0, 0.0])).unwrap();
    source.add_edge("a", "x", coord(1.0), coord(0.0)).unwrap();
    source.add_edge("a", "y", coord(1.0), coord(0.0)).unwrap();
    let target = star("t", &[("m", 0.0), ("p", 0.5), ("n", 1.0)]);

    let mut blender = TopoBlender::new(&source, &target);
    blender.best_partial_correspondence().unwrap();
    blender.reconcile_links(&mut NoObserver);

    let active = blender.active();
    let s = index(active, "s");
    assert_eq!(blender.deficits().get(&s), Some(&1));
    assert_eq!(state(active, "b"), NodeState::Sleep);
    assert_eq!(state(active, "x"), NodeState::Disconnected);
    assert_eq!(state(active, "y"), NodeState::Disconnected);

    assert_eq!(blender.repair_deficits(&mut NoObserver), 2);
    assert_eq!(blender.deficits().get(&s), Some(&0));

    let report = blender.blend();
    let graph = &report.graph;
    let (x, y) = (index(graph, "x"), index(graph, "y"));
    assert!(graph.has_edge(s, x));
    assert!(graph.has_edge(s, y));
    assert_eq!(graph.nodes()[x].correspond(), Some("p"));
    assert_eq!(graph.nodes()[y].correspond(), Some("n"));
    assert_eq!(graph.count(NodeState::Disconnected), 0);
    assert!(report.deficits.is_empty());
    assert_eq!(report.unmatched, vec!["b".to_string()]);
}

#[test]
fn disconnected_part_is_reattached_where_a_link_is_missing() {
    // the right leg hangs from the hub in the source but from the left leg in the target
    let source = star("s", &[("a", 0.0), ("b", 1.0)]);
    let mut target = star("t", &[("m", 0.0)]);
    target.add_node(bar("n", [4.0, 0.0, 0.0], [4.0, 1.0, 0.0])).unwrap();
    target.add_edge("m", "n", coord(1.0), coord(1.0)).unwrap();

    let mut events = vec![];
    let mut observer = |_: usize, _: &DynamicGraph, event: &BlendEvent| {
        events.push(event.clone());
    };
    let report = TopoBlender::new(&source, &target).blend_with_observer(&mut observer);

    assert!(events.contains(&BlendEvent::Reconnected {
        node: "a".to_string(),
        with: "b".to_string(),
    }));
    assert_eq!(events.last(), Some(&BlendEvent::Final));

    let graph = &report.graph;
    let (s, a, b) = (index(graph, "s"), index(graph, "a"), index(graph, "b"));
    assert!(graph.has_edge(s, a));
    assert!(graph.has_edge(a, b));
    assert!(!graph.has_edge(s, b));
    assert_eq!(graph.nodes()[b].correspond(), Some("n"));
    assert_eq!(graph.count(NodeState::Done), 3);
    assert!(report.is_complete());
}

#[test]
fn blending_twice_gives_the_same_report() {
    let source = star("s", &[("a", 0.0), ("b", 1.0)]);
    let mut target = star("t", &[("m", 0.0)]);
    target.add_node(bar("n", [4.0, 0.0, 0.0], [4.0, 1.0, 0.0])).unwrap();
    target.add_edge("m", "n", coord(1.0), coord(1.0)).unwrap();

    let mut blender = TopoBlender::new(&source, &target);
    let first = blender.blend();
    let second = blender.blend();
    assert_eq!(first, second);
}

#[test]
fn observer_does_not_change_the_result() {
    let source = star("s", &[("l0", 0.0), ("l1", 0.5), ("l2", 1.0)]);
    let target = star("t", &[("m0", 0.0), ("m1", 1.0)]);

    let mut steps = vec![];
    let mut observer = |step: usize, _: &DynamicGraph, event: &BlendEvent| {
        steps.push((step, event.to_string()));
    };
    let observed = TopoBlender::new(&source, &target).blend_with_observer(&mut observer);
    let silent = TopoBlender::new(&source, &target).blend();

    assert_eq!(observed, silent);
    assert_eq!(steps.len(), silent.steps);
    assert!(steps.iter().enumerate().all(|(i, (step, _))| i == *step));
    assert_eq!(steps[0].1, "Initial graph, [s] corresponds to [t]");
    assert_eq!(steps[1].1, "Removed links s:l1 from node [s]");
}

#[test]
fn options_are_applied() {
    let options = BlendOptions::default()
        .with_distance_step(0.5)
        .with_max_samples_per_part(16);
    assert_relative_eq!(options.distance_step(), 0.5);
    assert_eq!(options.max_samples_per_part(), 16);

    let source = star("s", &[("a", 0.0), ("b", 1.0)]);
    let mut target = star("t", &[("m", 0.0)]);
    target.add_node(bar("n", [4.0, 0.0, 0.0], [4.0, 1.0, 0.0])).unwrap();
    target.add_edge("m", "n", coord(1.0), coord(1.0)).unwrap();

    let report = TopoBlender::new(&source, &target)
        .with_options(options)
        .with_matcher(Box::new(GreedyLinkMatcher))
        .blend();
    assert!(report.is_complete());
}

fn arbitrary_star(prefix: &'static str) -> impl Strategy<Value = ShapeGraph<f64>> {
    (
        0.5..6.0f64,
        prop::collection::vec((0.0..=1.0f64, 0.2..3.0f64), 0..5),
    )
        .prop_map(move |(length, legs)| {
            let hub = format!("{prefix}hub");
            let mut graph = ShapeGraph::new();
            graph
                .add_node(bar(&hub, [0.0, 0.0, 0.0], [length, 0.0, 0.0]))
                .unwrap();
            for (i, (u, height)) in legs.into_iter().enumerate() {
                let leg = format!("{prefix}{i}");
                let x = length * u;
                graph
                    .add_node(bar(&leg, [x, 0.0, 0.0], [x, height, 0.0]))
                    .unwrap();
                graph.add_edge(&hub, &leg, coord(u), coord(0.0)).unwrap();
            }
            graph
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn anchor_is_the_best_scoring_pair(
        source in arbitrary_star("s"),
        target in arbitrary_star("t"),
    ) {
        let mut blender = TopoBlender::new(&source, &target);
        let scores = blender.score_pairs();
        prop_assert_eq!(scores.len(), source.nodes().len() * target.nodes().len());
        prop_assert!(scores.windows(2).all(|w| w[0].score <= w[1].score));

        let best = blender.best_partial_correspondence().unwrap();
        prop_assert!(scores.iter().all(|s| best.score <= s.score));
        prop_assert_eq!(&best, &scores[0]);
        prop_assert_eq!(blender.active().count(NodeState::Active), 1);
    }

    #[test]
    fn reconciliation_is_bounded_and_keeps_every_node(
        source in arbitrary_star("s"),
        target in arbitrary_star("t"),
    ) {
        let mut blender = TopoBlender::new(&source, &target);
        blender.best_partial_correspondence().unwrap();
        let iterations = blender.reconcile_links(&mut NoObserver);
        prop_assert!(iterations <= target.nodes().len());

        let mut totals = vec![];
        let mut observer = |_: usize, graph: &DynamicGraph, _: &BlendEvent| {
            totals.push(NodeState::ALL.iter().map(|s| graph.count(*s)).sum::<usize>());
        };
        let report = blender.blend_with_observer(&mut observer);
        prop_assert_eq!(totals.len(), report.steps);
        prop_assert!(totals.iter().all(|t| *t == source.nodes().len()));

        let graph = &report.graph;
        prop_assert_eq!(graph.nodes().len(), source.nodes().len());
        let total: usize = NodeState::ALL.iter().map(|s| graph.count(*s)).sum();
        prop_assert_eq!(total, source.nodes().len());
        prop_assert_eq!(graph.count(NodeState::Active), 0);

        // matched parts are matched injectively
        let mut targets: Vec<_> = graph.nodes().iter().filter_map(|n| n.correspond()).collect();
        let matched = targets.len();
        targets.sort();
        targets.dedup();
        prop_assert_eq!(targets.len(), matched);
    }
}

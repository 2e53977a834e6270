use std::cmp::Ordering;
use std::collections::BTreeMap;

use itertools::Itertools;

use crate::{
    distance::GraphDistance,
    error::BlendError,
    misc::FloatingPoint,
    structure::{Segment, ShapeGraph},
};

use super::{
    BlendEvent, BlendObserver, BlendOptions, BlendReport, DynamicGraph, GreedyLinkMatcher,
    LinkMatcher, LinkPair, NoObserver, NodeQuery, NodeState,
};

/// Dissimilarity of a source part and a target part of the same type
#[derive(Debug, Clone, PartialEq)]
pub struct PairScore<T> {
    pub source: String,
    pub target: String,
    pub score: T,
}

/// Dissimilarity of two parts: difference of areas, distance of centers,
/// and a penalty on matching two small parts
pub fn pair_score<T: FloatingPoint, S: Segment<T>>(a: &S, b: &S) -> T {
    part_score(a.area(), &a.center(), b.area(), &b.center())
}

fn part_score<T: FloatingPoint>(
    area_a: T,
    center_a: &nalgebra::Point3<T>,
    area_b: T,
    center_b: &nalgebra::Point3<T>,
) -> T {
    (area_a - area_b).abs() + (center_a - center_b).norm() + T::one() / area_a.min(area_b)
}

/// Morphs the topology of a source shape graph toward a target shape graph.
///
/// The blend runs in phases over a working copy of the source topology:
/// 1. anchor the traversal at the most similar pair of parts,
/// 2. walk outward from the anchor, cutting surplus links and recording missing ones,
/// 3. reattach disconnected parts where links are missing, nearest by geodesic distance,
/// 4. add the target links between nodes that are already matched.
///
/// Growing new parts for links that remain missing is not attempted; they are
/// reported in the [`BlendReport`].
pub struct TopoBlender<'a, T: FloatingPoint> {
    source: &'a ShapeGraph<T>,
    target: &'a ShapeGraph<T>,
    target_topology: DynamicGraph,
    active: DynamicGraph,
    need_link: BTreeMap<usize, usize>,
    dead_links: BTreeMap<usize, Vec<String>>,
    anchor: Option<(String, String)>,
    step: usize,
    options: BlendOptions<T>,
    matcher: Box<dyn LinkMatcher<T>>,
}

impl<'a, T: FloatingPoint> TopoBlender<'a, T> {
    pub fn new(source: &'a ShapeGraph<T>, target: &'a ShapeGraph<T>) -> Self {
        Self {
            source,
            target,
            target_topology: DynamicGraph::from_graph(target),
            active: DynamicGraph::from_graph(source),
            need_link: BTreeMap::new(),
            dead_links: BTreeMap::new(),
            anchor: None,
            step: 0,
            options: BlendOptions::default(),
            matcher: Box::new(GreedyLinkMatcher),
        }
    }

    pub fn with_options(mut self, options: BlendOptions<T>) -> Self {
        self.options = options;
        self
    }

    /// Replace the strategy pairing links of matched nodes
    pub fn with_matcher(mut self, matcher: Box<dyn LinkMatcher<T>>) -> Self {
        self.matcher = matcher;
        self
    }

    /// The working graph
    pub fn active(&self) -> &DynamicGraph {
        &self.active
    }

    /// Links still missing per working node
    pub fn deficits(&self) -> &BTreeMap<usize, usize> {
        &self.need_link
    }

    /// Run every phase and report the reconciled working graph
    pub fn blend(&mut self) -> BlendReport {
        self.blend_with_observer(&mut NoObserver)
    }

    /// Run every phase, showing each step to the observer
    pub fn blend_with_observer(&mut self, observer: &mut dyn BlendObserver) -> BlendReport {
        match self.best_partial_correspondence() {
            Ok(best) => {
                log::info!(
                    "anchored [{}] to [{}] with score {:?}",
                    best.source,
                    best.target,
                    best.score
                );
                self.emit(
                    observer,
                    BlendEvent::Initial {
                        source: best.source,
                        target: best.target,
                    },
                );
                self.reconcile_links(observer);
                self.repair_deficits(observer);
                self.finalize(observer);
                self.log_unresolved();
            }
            Err(e) => log::warn!("blend stopped before reconciliation: {e}"),
        }
        self.emit(observer, BlendEvent::Final);
        self.report()
    }

    /// Score every pair of same-typed parts, best pairs first.
    /// Pairs with equal scores keep the source-major insertion order.
    pub fn score_pairs(&self) -> Vec<PairScore<T>> {
        let describe = |g: &'a ShapeGraph<T>| {
            g.nodes()
                .iter()
                .map(|n| (n.id(), n.segment_type(), n.area(), n.center()))
                .collect_vec()
        };
        let sources = describe(self.source);
        let targets = describe(self.target);

        let mut scores = vec![];
        for (source, source_type, source_area, source_center) in sources.iter() {
            for (target, target_type, target_area, target_center) in targets.iter() {
                if source_type != target_type {
                    continue;
                }
                scores.push(PairScore {
                    source: source.to_string(),
                    target: target.to_string(),
                    score: part_score(*source_area, source_center, *target_area, target_center),
                });
            }
        }

        scores.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal));
        scores
    }

    /// Reset the working graph and anchor it at the best scoring pair of parts
    pub fn best_partial_correspondence(&mut self) -> Result<PairScore<T>, BlendError> {
        self.active = DynamicGraph::from_graph(self.source);
        self.active.flag_nodes(NodeState::Sleep);
        self.need_link.clear();
        self.dead_links.clear();
        self.anchor = None;
        self.step = 0;

        let best = self
            .score_pairs()
            .into_iter()
            .next()
            .ok_or(BlendError::Empty("part pair of the same type"))?;

        let root = self
            .active
            .node_index(&NodeQuery::Original(&best.source))
            .ok_or_else(|| BlendError::NotFound(format!("part `{}`", best.source)))?;
        self.active.set_correspond(root, best.target.clone())?;
        self.active.set_state(root, NodeState::Active)?;
        self.anchor = Some((best.source.clone(), best.target.clone()));

        Ok(best)
    }

    /// Walk the working graph from the anchor, reconciling each node's link count
    /// with its counterpart. Returns the number of processed nodes.
    pub fn reconcile_links(&mut self, observer: &mut dyn BlendObserver) -> usize {
        let target_count = self.target.nodes().len();
        let mut iterations = 0;

        while self.active.count(NodeState::Done) < target_count && iterations < target_count {
            let Some(active_idx) = self.active.node_index(&NodeQuery::State(NodeState::Active))
            else {
                log::debug!("no active node left, stopping link reconciliation");
                break;
            };
            iterations += 1;

            let event = match self.reconcile_node(active_idx) {
                Ok(event) => event,
                Err(e) => {
                    log::debug!("skipped node {active_idx}: {e}");
                    BlendEvent::Skipped {
                        node: self
                            .active
                            .node(active_idx)
                            .map(|n| n.original().to_string())
                            .unwrap_or_default(),
                        reason: e.to_string(),
                    }
                }
            };
            // the index comes from the graph, it exists
            let _ = self.active.set_state(active_idx, NodeState::Done);
            self.emit(observer, event);
        }

        log::info!(
            "link reconciliation processed {} node(s), {} done out of {} target part(s)",
            iterations,
            self.active.count(NodeState::Done),
            target_count
        );
        iterations
    }

    fn reconcile_node(&mut self, active_idx: usize) -> Result<BlendEvent, BlendError> {
        let (source, target) = (self.source, self.target);
        let node = self
            .active
            .node(active_idx)
            .ok_or_else(|| BlendError::NotFound(format!("node {active_idx}")))?;
        let active_id = node.original().to_string();
        let target_id = node
            .correspond()
            .ok_or_else(|| BlendError::NotFound(format!("correspondence of `{active_id}`")))?
            .to_string();

        // links of the source part that are still present in the working graph
        let coord_active = source
            .links_coords(&active_id)
            .into_iter()
            .filter(|lc| {
                lc.link
                    .other_node(&active_id)
                    .and_then(|other| self.active.node_index(&NodeQuery::Original(other)))
                    .is_some_and(|other_idx| self.active.has_edge(active_idx, other_idx))
            })
            .collect_vec();
        let coord_target = target.links_coords(&target_id);

        let mut pairs = self.matcher.match_links(&coord_active, &coord_target);
        let diff = coord_active.len() as isize - coord_target.len() as isize;

        match diff.cmp(&0) {
            Ordering::Greater => {
                let mut removed = vec![];
                for _ in 0..diff {
                    let Some(worst) = pairs.pop() else {
                        break;
                    };
                    let Some(other_idx) = self.other_index(&worst, &active_id) else {
                        continue;
                    };
                    self.active.remove_edge(active_idx, other_idx);
                    if self.active.valence(other_idx) == 0 {
                        self.active.set_state(other_idx, NodeState::Disconnected)?;
                    }
                    removed.push(worst.active.link.id().to_string());
                }
                self.dead_links
                    .entry(active_idx)
                    .or_default()
                    .extend(removed.iter().cloned());
                self.propagate(&pairs, &active_id, &target_id);
                Ok(BlendEvent::RemovedLinks {
                    node: active_id,
                    links: removed,
                })
            }
            Ordering::Less => {
                let missing = diff.unsigned_abs();
                self.need_link.insert(active_idx, missing);
                self.propagate(&pairs, &active_id, &target_id);
                Ok(BlendEvent::NeedLinks {
                    node: active_id,
                    missing,
                })
            }
            Ordering::Equal => {
                // TODO: equal counts are not checked for link quality, decide whether
                // mismatched coordinates should trigger a realignment
                Ok(BlendEvent::SameLinkCount { node: active_id })
            }
        }
    }

    fn other_index(&self, pair: &LinkPair<'_, T>, active_id: &str) -> Option<usize> {
        let other = pair.active.link.other_node(active_id)?;
        self.active.node_index(&NodeQuery::Original(other))
    }

    /// Wake the neighbors reached through matched links and assign them the
    /// part on the other end of the matched target link
    fn propagate(&mut self, pairs: &[LinkPair<'_, T>], active_id: &str, target_id: &str) {
        for pair in pairs {
            let Some(other_idx) = self.other_index(pair, active_id) else {
                continue;
            };
            let Some(other_target) = pair
                .target
                .and_then(|t| t.link.other_node(target_id))
                .map(str::to_string)
            else {
                continue;
            };
            let Some(other) = self.active.node(other_idx) else {
                continue;
            };
            if matches!(other.state(), NodeState::Done | NodeState::Disconnected) {
                continue;
            }
            // keep the correspondence injective
            if let Some(owner) = self
                .active
                .node_index(&NodeQuery::Correspond(&other_target))
                .filter(|owner| *owner != other_idx)
            {
                log::debug!(
                    "[{other_target}] already corresponds to node {owner}, node {other_idx} stays as is"
                );
                continue;
            }
            let _ = self.active.set_state(other_idx, NodeState::Active);
            let _ = self.active.set_correspond(other_idx, other_target);
        }
    }

    /// Attach disconnected parts to nodes that lack links.
    /// Returns the number of new connections.
    pub fn repair_deficits(&mut self, observer: &mut dyn BlendObserver) -> usize {
        let nodes = self.need_link.keys().copied().collect_vec();
        let mut connected = 0;
        for index in nodes {
            match self.repair_node(index, observer) {
                Ok(n) => connected += n,
                Err(e) => log::debug!("deficit repair of node {index} stopped: {e}"),
            }
        }
        log::info!("deficit repair made {connected} connection(s)");
        connected
    }

    fn repair_node(
        &mut self,
        index: usize,
        observer: &mut dyn BlendObserver,
    ) -> Result<usize, BlendError> {
        let (source, target) = (self.source, self.target);
        let node = self
            .active
            .node(index)
            .ok_or_else(|| BlendError::NotFound(format!("node {index}")))?;
        let active_id = node.original().to_string();
        let target_id = node
            .correspond()
            .ok_or_else(|| BlendError::NotFound(format!("correspondence of `{active_id}`")))?
            .to_string();
        let target_idx = self
            .target_topology
            .node_index(&NodeQuery::Original(&target_id))
            .ok_or_else(|| BlendError::NotFound(format!("target part `{target_id}`")))?;

        // target neighbors already mirrored by a neighbor of the working node
        let matched = self
            .active
            .neighbors(index)
            .into_iter()
            .filter_map(|n| self.active.node(n)?.correspond().map(str::to_string))
            .collect_vec();
        let missing = self
            .target_topology
            .neighbors(target_idx)
            .into_iter()
            .filter_map(|n| self.target_topology.node(n).map(|n| n.original().to_string()))
            .filter(|id| !matched.contains(id))
            .collect_vec();

        let mut connected = 0;
        for target_other in missing {
            let need = self.need_link.get(&index).copied().unwrap_or(0);
            if self
                .active
                .node_index(&NodeQuery::Correspond(&target_other))
                .is_some()
            {
                // already matched elsewhere, a second part would break injectivity
                continue;
            }

            let disconnected = self
                .active
                .nodes_with(&NodeQuery::State(NodeState::Disconnected));
            if disconnected.is_empty() {
                return Err(BlendError::Unresolvable {
                    node: active_id,
                    missing: need,
                });
            }

            let coordinate = match target
                .original_link(&target_id, &target_other)
                .map(|link| link.coord_of(&target_id))
            {
                Ok(Some(c)) => c,
                Ok(None) | Err(_) => {
                    log::debug!("no link between [{target_id}] and [{target_other}]");
                    continue;
                }
            };
            let link_position = source.position(&active_id, &coordinate)?;

            let mut gd = GraphDistance::new(source)
                .with_max_samples(self.options.max_samples_per_part());
            if let Err(e) = gd.compute_distances(&link_position, self.options.distance_step()) {
                log::debug!("distance field from [{active_id}] failed: {e}");
                continue;
            }

            // rank both extremities of every disconnected part
            let mut ranked = vec![];
            for d in disconnected {
                let Some(part) = self
                    .active
                    .node(d)
                    .and_then(|n| source.get_node(n.original()).ok())
                else {
                    continue;
                };
                for coord in [part.min_coord(), part.max_coord()] {
                    let distance = gd.distance_to(&part.position(&coord))?;
                    ranked.push((distance, d));
                }
            }
            ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
            let Some(&(_, closest)) = ranked.first() else {
                continue;
            };

            self.active.set_correspond(closest, target_other)?;
            self.active.set_state(closest, NodeState::Active)?;
            self.active.add_edge(index, closest)?;
            self.need_link.insert(index, need.saturating_sub(1));
            connected += 1;

            let with = self
                .active
                .node(closest)
                .map(|n| n.original().to_string())
                .unwrap_or_default();
            self.emit(
                observer,
                BlendEvent::Reconnected {
                    node: active_id.clone(),
                    with,
                },
            );
        }

        Ok(connected)
    }

    /// Give every active node the links its counterpart has toward already
    /// matched nodes. Returns the number of added edges.
    pub fn finalize(&mut self, observer: &mut dyn BlendObserver) -> usize {
        let mut added = 0;
        while let Some(active_idx) = self.active.node_index(&NodeQuery::State(NodeState::Active)) {
            match self.fill_edges(active_idx, observer) {
                Ok(n) => added += n,
                Err(e) => log::debug!("finalization of node {active_idx} skipped: {e}"),
            }
            let _ = self.active.set_state(active_idx, NodeState::Done);
        }
        log::info!("finalization added {added} edge(s)");
        added
    }

    fn fill_edges(
        &mut self,
        active_idx: usize,
        observer: &mut dyn BlendObserver,
    ) -> Result<usize, BlendError> {
        let node = self
            .active
            .node(active_idx)
            .ok_or_else(|| BlendError::NotFound(format!("node {active_idx}")))?;
        let active_id = node.original().to_string();
        let target_id = node
            .correspond()
            .ok_or_else(|| BlendError::NotFound(format!("correspondence of `{active_id}`")))?
            .to_string();
        let target_idx = self
            .target_topology
            .node_index(&NodeQuery::Original(&target_id))
            .ok_or_else(|| BlendError::NotFound(format!("target part `{target_id}`")))?;

        let target_others = self
            .target_topology
            .neighbors(target_idx)
            .into_iter()
            .filter_map(|n| self.target_topology.node(n).map(|n| n.original().to_string()))
            .collect_vec();

        let mut added = 0;
        for target_other in target_others {
            // a disconnected part keeps its old counterpart but takes no new edge
            let Some(other_idx) = self
                .active
                .node_index(&NodeQuery::Correspond(&target_other))
                .filter(|idx| {
                    self.active
                        .node(*idx)
                        .is_some_and(|n| n.state() != NodeState::Disconnected)
                })
            else {
                continue;
            };
            if other_idx == active_idx || self.active.has_edge(active_idx, other_idx) {
                continue;
            }
            self.active.add_edge(active_idx, other_idx)?;
            for idx in [active_idx, other_idx] {
                if let Some(need) = self.need_link.get_mut(&idx) {
                    *need = need.saturating_sub(1);
                }
            }
            added += 1;

            let with = self
                .active
                .node(other_idx)
                .map(|n| n.original().to_string())
                .unwrap_or_default();
            self.emit(
                observer,
                BlendEvent::EdgeFilled {
                    node: active_id.clone(),
                    with,
                },
            );
        }
        Ok(added)
    }

    fn log_unresolved(&self) {
        for (idx, need) in self.need_link.iter().filter(|(_, n)| **n > 0) {
            if let Some(node) = self.active.node(*idx) {
                log::warn!(
                    "{}",
                    BlendError::Unresolvable {
                        node: node.original().to_string(),
                        missing: *need,
                    }
                );
            }
        }
        for node in self.active.nodes().iter().filter(|n| n.correspond().is_none()) {
            log::warn!("[{}] has no counterpart, state {}", node.original(), node.state());
        }
    }

    fn emit(&mut self, observer: &mut dyn BlendObserver, event: BlendEvent) {
        log::debug!("step {}: {}", self.step, event);
        observer.on_step(self.step, &self.active, &event);
        self.step += 1;
    }

    fn report(&self) -> BlendReport {
        let name = |idx: &usize| {
            self.active
                .node(*idx)
                .map(|n| n.original().to_string())
                .unwrap_or_default()
        };
        BlendReport {
            graph: self.active.clone(),
            anchor: self.anchor.clone(),
            deficits: self
                .need_link
                .iter()
                .filter(|(_, need)| **need > 0)
                .map(|(idx, need)| (name(idx), *need))
                .collect(),
            removed_links: self
                .dead_links
                .iter()
                .filter(|(_, links)| !links.is_empty())
                .map(|(idx, links)| (name(idx), links.clone()))
                .collect(),
            unmatched: self
                .active
                .nodes()
                .iter()
                .filter(|n| n.correspond().is_none())
                .map(|n| n.original().to_string())
                .collect(),
            steps: self.step,
        }
    }
}

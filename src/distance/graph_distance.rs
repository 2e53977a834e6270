use std::cmp::Ordering;
use std::collections::BinaryHeap;

use nalgebra::Point3;

use crate::{
    error::BlendError,
    misc::FloatingPoint,
    structure::{Segment, ShapeGraph},
};

/// Upper bound of samples taken on a single part
pub const DEFAULT_MAX_SAMPLES_PER_PART: usize = 128;

/// Geodesic distance field over a shape graph.
///
/// The shape is discretized into point samples joined along each part and across
/// links; distances are shortest paths in that sample graph. A field is built by
/// [`GraphDistance::compute_distances`] and answers queries until the next build.
pub struct GraphDistance<'a, T: FloatingPoint> {
    graph: &'a ShapeGraph<T>,
    max_samples: usize,
    field: Option<DistanceField<T>>,
}

#[derive(Debug, Clone)]
struct DistanceField<T: FloatingPoint> {
    points: Vec<Point3<T>>,
    distances: Vec<T>,
    previous: Vec<Option<usize>>,
}

impl<'a, T: FloatingPoint> GraphDistance<'a, T> {
    pub fn new(graph: &'a ShapeGraph<T>) -> Self {
        Self {
            graph,
            max_samples: DEFAULT_MAX_SAMPLES_PER_PART,
            field: None,
        }
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples.max(2);
        self
    }

    pub fn is_computed(&self) -> bool {
        self.field.is_some()
    }

    /// Build the distance field from `source` with a sampling spacing of `step`
    pub fn compute_distances(&mut self, source: &Point3<T>, step: T) -> anyhow::Result<()> {
        anyhow::ensure!(step > T::zero(), "Sampling step must be positive");

        let (points, adjacency) = self.discretize(step);
        anyhow::ensure!(!points.is_empty(), "Shape graph has no parts to sample");

        let (seed, offset) = nearest(&points, source).ok_or(BlendError::Empty("sample"))?;
        let (distances, previous) = dijkstra(&adjacency, seed, offset);

        log::debug!(
            "distance field over {} samples seeded at sample {}",
            points.len(),
            seed
        );
        self.field = Some(DistanceField {
            points,
            distances,
            previous,
        });
        Ok(())
    }

    /// Distance from the field source to `point`.
    /// Points out of reach of the source are at `T::max_value()`.
    pub fn distance_to(&self, point: &Point3<T>) -> Result<T, BlendError> {
        let field = self.field.as_ref().ok_or(BlendError::NotComputed)?;
        let (index, offset) = nearest(&field.points, point).ok_or(BlendError::Empty("sample"))?;
        let d = field.distances[index];
        Ok(match T::max_value() {
            Some(max) if d >= max => max,
            _ => d + offset,
        })
    }

    /// Samples along the shortest path from the field source to the sample nearest `point`
    pub fn path_to(&self, point: &Point3<T>) -> Result<Vec<Point3<T>>, BlendError> {
        let field = self.field.as_ref().ok_or(BlendError::NotComputed)?;
        let (mut index, _) = nearest(&field.points, point).ok_or(BlendError::Empty("sample"))?;
        if T::max_value().is_some_and(|max| field.distances[index] >= max) {
            return Err(BlendError::NotFound("path to unreachable point".into()));
        }

        let mut path = vec![field.points[index]];
        while let Some(prev) = field.previous[index] {
            index = prev;
            path.push(field.points[index]);
        }
        path.reverse();
        Ok(path)
    }

    /// Sample every part and join the samples into a weighted adjacency list
    #[allow(clippy::type_complexity)]
    fn discretize(&self, step: T) -> (Vec<Point3<T>>, Vec<Vec<(usize, T)>>) {
        let mut points = vec![];
        let mut adjacency: Vec<Vec<(usize, T)>> = vec![];
        let mut ranges = vec![];

        for part in self.graph.nodes() {
            let samples = part.discretize(step, self.max_samples);
            let offset = points.len();
            adjacency.extend(samples.points.iter().map(|_| vec![]));
            for (a, b) in samples.edges {
                let w = (samples.points[b] - samples.points[a]).norm();
                adjacency[offset + a].push((offset + b, w));
                adjacency[offset + b].push((offset + a, w));
            }
            points.extend(samples.points);
            ranges.push((part.id(), offset..points.len()));
        }

        for link in self.graph.edges() {
            let (n1, n2) = link.nodes();
            let ends = [n1, n2].map(|id| {
                let range = ranges.iter().find(|(pid, _)| *pid == id)?.1.clone();
                let part = self.graph.get_node(id).ok()?;
                let anchor = part.position(&link.coord_of(id)?);
                let (i, _) = nearest(&points[range.clone()], &anchor)?;
                Some(range.start + i)
            });
            if let [Some(a), Some(b)] = ends {
                let w = (points[b] - points[a]).norm();
                adjacency[a].push((b, w));
                adjacency[b].push((a, w));
            }
        }

        (points, adjacency)
    }
}

/// Index of the sample nearest `point` and the distance to it
fn nearest<T: FloatingPoint>(points: &[Point3<T>], point: &Point3<T>) -> Option<(usize, T)> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, (p - point).norm()))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
}

struct Visit<T> {
    cost: T,
    index: usize,
}

impl<T: PartialOrd> PartialEq for Visit<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: PartialOrd> Eq for Visit<T> {}

/// Reversed ordering so the heap pops the cheapest visit first
impl<T: PartialOrd> Ord for Visit<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl<T: PartialOrd> PartialOrd for Visit<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[allow(clippy::type_complexity)]
fn dijkstra<T: FloatingPoint>(
    adjacency: &[Vec<(usize, T)>],
    seed: usize,
    seed_cost: T,
) -> (Vec<T>, Vec<Option<usize>>) {
    let unreachable = T::max_value().unwrap_or(T::lit(f64::MAX));
    let mut distances = vec![unreachable; adjacency.len()];
    let mut previous = vec![None; adjacency.len()];
    let mut heap = BinaryHeap::new();

    distances[seed] = seed_cost;
    heap.push(Visit {
        cost: seed_cost,
        index: seed,
    });

    while let Some(Visit { cost, index }) = heap.pop() {
        if cost > distances[index] {
            continue;
        }
        for &(next, w) in adjacency[index].iter() {
            let candidate = cost + w;
            if candidate < distances[next] {
                distances[next] = candidate;
                previous[next] = Some(index);
                heap.push(Visit {
                    cost: candidate,
                    index: next,
                });
            }
        }
    }

    (distances, previous)
}

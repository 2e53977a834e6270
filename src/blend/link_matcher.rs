use std::cmp::Ordering;

use crate::{misc::FloatingPoint, structure::LinkCoordinates};

/// A link of the working node paired with its best counterpart on the target node
#[derive(Clone, Copy, Debug)]
pub struct LinkPair<'a, T: FloatingPoint> {
    pub active: LinkCoordinates<'a, T>,
    /// `None` when the target node has no link at all
    pub target: Option<LinkCoordinates<'a, T>>,
    pub distance: T,
}

/// Strategy pairing the links of a working node with the links of its target node.
pub trait LinkMatcher<T: FloatingPoint> {
    /// Pair every active link with a target link.
    /// The result is ordered by ascending distance, the worst matches last.
    fn match_links<'a>(
        &self,
        active: &[LinkCoordinates<'a, T>],
        target: &[LinkCoordinates<'a, T>],
    ) -> Vec<LinkPair<'a, T>>;
}

/// Pairs each active link with its nearest target link by attachment coordinate.
///
/// Several active links may pick the same target link: this is a greedy
/// approximation, not an optimal bipartite assignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyLinkMatcher;

impl<T: FloatingPoint> LinkMatcher<T> for GreedyLinkMatcher {
    fn match_links<'a>(
        &self,
        active: &[LinkCoordinates<'a, T>],
        target: &[LinkCoordinates<'a, T>],
    ) -> Vec<LinkPair<'a, T>> {
        let unmatched = T::max_value().unwrap_or(T::lit(f64::MAX));
        let mut pairs: Vec<_> = active
            .iter()
            .map(|a| {
                let closest = target
                    .iter()
                    .map(|t| (t, (a.coord() - t.coord()).norm()))
                    .min_by(|x, y| x.1.partial_cmp(&y.1).unwrap_or(Ordering::Equal));
                match closest {
                    Some((t, distance)) => LinkPair {
                        active: *a,
                        target: Some(*t),
                        distance,
                    },
                    None => LinkPair {
                        active: *a,
                        target: None,
                        distance: unmatched,
                    },
                }
            })
            .collect();

        // stable, equal distances keep the link order
        pairs.sort_by(|x, y| {
            x.distance
                .partial_cmp(&y.distance)
                .unwrap_or(Ordering::Equal)
        });
        pairs
    }
}

use nalgebra::{Point3, Vector3, Vector4};

use crate::{curve::NurbsCurve, misc::FloatingPoint, surface::NurbsSurface};

/// Geometric type tag of a part.
/// Parts of differing type are never put in correspondence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SegmentType {
    Curve,
    Sheet,
}

/// Point samples of a segment and the pairs of samples adjacent on the segment.
#[derive(Debug, Clone)]
pub struct SegmentSamples<T: FloatingPoint> {
    pub points: Vec<Point3<T>>,
    pub edges: Vec<(usize, usize)>,
}

/// Geometry queries the blending engine needs from a part.
///
/// Coordinates are 4-dimensional and normalized to `[0, 1]` in each parametric
/// direction: a curve reads component 0, a sheet reads components 0 and 1.
pub trait Segment<T: FloatingPoint> {
    fn segment_type(&self) -> SegmentType;

    /// Length for curves, surface area for sheets
    fn area(&self) -> T;

    fn center(&self) -> Point3<T>;

    /// Map a normalized coordinate to a 3D position
    fn position(&self, coord: &Vector4<T>) -> Point3<T>;

    fn min_coord(&self) -> Vector4<T> {
        Vector4::zeros()
    }

    fn max_coord(&self) -> Vector4<T> {
        Vector4::repeat(T::one())
    }

    /// Sample the segment with a spacing of roughly `step`,
    /// never producing more than `max_samples` points
    fn discretize(&self, step: T, max_samples: usize) -> SegmentSamples<T>;
}

const CENTER_SAMPLES: usize = 32;

impl<T: FloatingPoint> Segment<T> for NurbsCurve<T> {
    fn segment_type(&self) -> SegmentType {
        SegmentType::Curve
    }

    fn area(&self) -> T {
        self.try_length().unwrap_or_else(|_| T::zero())
    }

    fn center(&self) -> Point3<T> {
        let (start, end) = self.knots_domain();
        mean(&self.sample_regular_range(start, end, CENTER_SAMPLES))
    }

    fn position(&self, coord: &Vector4<T>) -> Point3<T> {
        let u = self.knots().denormalize(self.degree(), coord.x);
        self.point_at(u)
    }

    fn discretize(&self, step: T, max_samples: usize) -> SegmentSamples<T> {
        let count = samples_for(self.area(), step, max_samples.max(2)).max(2);
        let (start, end) = self.knots_domain();
        SegmentSamples {
            points: self.sample_regular_range(start, end, count),
            edges: (0..count - 1).map(|i| (i, i + 1)).collect(),
        }
    }
}

impl<T: FloatingPoint> Segment<T> for NurbsSurface<T> {
    fn segment_type(&self) -> SegmentType {
        SegmentType::Sheet
    }

    fn area(&self) -> T {
        self.try_area().unwrap_or_else(|_| T::zero())
    }

    fn center(&self) -> Point3<T> {
        let grid = self.regular_sample_points(8, 8);
        mean(&grid.into_iter().flatten().collect::<Vec<_>>())
    }

    fn position(&self, coord: &Vector4<T>) -> Point3<T> {
        let u = self.u_knots().denormalize(self.u_degree(), coord.x);
        let v = self.v_knots().denormalize(self.v_degree(), coord.y);
        self.point_at(u, v)
    }

    fn discretize(&self, step: T, max_samples: usize) -> SegmentSamples<T> {
        // extents along each parametric direction from a coarse grid
        let coarse = self.regular_sample_points(4, 4);
        let extent_u = (0..=4)
            .map(|j| polyline_length((0..=4).map(|i| coarse[i][j])))
            .fold(T::zero(), |a, b| a.max(b));
        let extent_v = coarse
            .iter()
            .map(|row| polyline_length(row.iter().copied()))
            .fold(T::zero(), |a, b| a.max(b));

        let side = ((max_samples.max(4) as f64).sqrt() as usize).max(2);
        let divs_u = samples_for(extent_u, step, side).max(2) - 1;
        let divs_v = samples_for(extent_v, step, side).max(2) - 1;

        let grid = self.regular_sample_points(divs_u, divs_v);
        let columns = divs_v + 1;
        let index = |i: usize, j: usize| i * columns + j;

        let mut edges = vec![];
        for i in 0..=divs_u {
            for j in 0..=divs_v {
                if i < divs_u {
                    edges.push((index(i, j), index(i + 1, j)));
                }
                if j < divs_v {
                    edges.push((index(i, j), index(i, j + 1)));
                }
                if i < divs_u && j < divs_v {
                    edges.push((index(i, j), index(i + 1, j + 1)));
                    edges.push((index(i + 1, j), index(i, j + 1)));
                }
            }
        }

        SegmentSamples {
            points: grid.into_iter().flatten().collect(),
            edges,
        }
    }
}

/// Number of samples to cover `extent` with spacing `step`, bounded by `max`
fn samples_for<T: FloatingPoint>(extent: T, step: T, max: usize) -> usize {
    // tolerate quadrature noise on exact multiples of the step
    let count = (extent / step - T::lit(1e-6))
        .ceil()
        .max(T::zero())
        .to_usize()
        .unwrap_or(max);
    (count + 1).min(max)
}

fn polyline_length<T: FloatingPoint>(points: impl Iterator<Item = Point3<T>>) -> T {
    let points: Vec<_> = points.collect();
    points
        .windows(2)
        .fold(T::zero(), |acc, w| acc + (w[1] - w[0]).norm())
}

fn mean<T: FloatingPoint>(points: &[Point3<T>]) -> Point3<T> {
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / T::lit(points.len().max(1) as f64))
}

use gauss_quad::GaussLegendre;
use itertools::Itertools;
use nalgebra::{Point3, Point4, Vector3, Vector4};

use crate::knot::KnotVector;
use crate::misc::FloatingPoint;

/// NURBS curve in 3D space
/// control points are stored with homogeneous coordinates, the last element being the `weight`
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NurbsCurve<T: FloatingPoint> {
    control_points: Vec<Point4<T>>,
    degree: usize,
    /// the length of the knot vector is equal to the `# of control points + degree + 1`
    knots: KnotVector<T>,
}

impl<T: FloatingPoint> NurbsCurve<T> {
    /// Create a new NURBS curve
    /// # Failures
    /// - if the number of control points is less than or equal to the degree
    /// - the number of knots is not equal to the number of control points + the degree + 1
    /// - the knots are decreasing somewhere
    /// - a weight is not positive
    ///
    /// # Example
    /// ```
    /// use topo_blend::prelude::*;
    /// use nalgebra::Point4;
    ///
    /// let control_points = vec![
    ///     Point4::new(0., 0., 0., 1.),
    ///     Point4::new(1., 1., 0., 1.),
    ///     Point4::new(2., 0., 0., 1.),
    /// ];
    /// let curve = NurbsCurve::try_new(2, control_points, vec![0., 0., 0., 1., 1., 1.]);
    /// assert!(curve.is_ok());
    /// ```
    pub fn try_new(
        degree: usize,
        control_points: Vec<Point4<T>>,
        knots: Vec<T>,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(
            control_points.len() > degree,
            "Too few control points for curve"
        );
        anyhow::ensure!(
            knots.len() == control_points.len() + degree + 1,
            "Invalid number of knots, got {}, expected {}",
            knots.len(),
            control_points.len() + degree + 1
        );
        anyhow::ensure!(
            control_points.iter().all(|p| p.w > T::zero()),
            "Weights must be positive"
        );
        let knots = KnotVector::new(knots);
        anyhow::ensure!(knots.is_non_decreasing(), "Knots must be non-decreasing");

        Ok(Self {
            control_points,
            degree,
            knots,
        })
    }

    /// Create a degree 1 curve passing through the given points
    pub fn try_polyline(points: &[Point3<T>]) -> anyhow::Result<Self> {
        anyhow::ensure!(points.len() >= 2, "Polyline needs at least two points");

        let mut knots = vec![T::zero()];
        let mut acc = T::zero();
        for (a, b) in points.iter().tuple_windows() {
            knots.push(acc);
            acc += (b - a).norm();
        }
        knots.push(acc);
        knots.push(acc);
        anyhow::ensure!(acc > T::zero(), "Polyline has zero length");

        let control_points = points
            .iter()
            .map(|p| Point4::new(p.x, p.y, p.z, T::one()))
            .collect();
        Self::try_new(1, control_points, knots)
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn knots(&self) -> &KnotVector<T> {
        &self.knots
    }

    pub fn control_points(&self) -> &[Point4<T>] {
        &self.control_points
    }

    pub fn knots_domain(&self) -> (T, T) {
        self.knots.domain(self.degree)
    }

    /// Return the dehomogenized control points
    pub fn dehomogenized_control_points(&self) -> Vec<Point3<T>> {
        self.control_points.iter().map(dehomogenize).collect()
    }

    /// Evaluate the curve at a given parameter to get a dehomogenized point
    pub fn point_at(&self, u: T) -> Point3<T> {
        dehomogenize(&self.point(u))
    }

    /// Evaluate the curve at a given parameter in homogeneous space
    fn point(&self, u: T) -> Point4<T> {
        let n = self.control_points.len() - 1;
        let span = self.knots.find_knot_span_index(n, self.degree, u);
        let basis = self.knots.basis_functions(span, u, self.degree);
        let coords = (0..=self.degree).fold(Vector4::zeros(), |acc, i| {
            acc + self.control_points[span - self.degree + i].coords * basis[i]
        });
        Point4::from(coords)
    }

    /// Evaluate the rational first derivative at a given parameter
    pub fn tangent_at(&self, u: T) -> Vector3<T> {
        let n = self.control_points.len() - 1;
        let span = self.knots.find_knot_span_index(n, self.degree, u);
        let ders = self
            .knots
            .derivative_basis_functions(span, u, self.degree, 1.min(self.degree));

        let mut h = [Vector4::zeros(), Vector4::zeros()];
        for (k, row) in ders.iter().enumerate() {
            for j in 0..=self.degree {
                h[k] += self.control_points[span - self.degree + j].coords * row[j];
            }
        }

        let w = h[0].w;
        let a0 = h[0].xyz();
        let a1 = h[1].xyz();
        (a1 - a0 * (h[1].w / w)) / w
    }

    /// Sample the curve at a given number of points between the start and end parameters
    pub fn sample_regular_range(&self, start: T, end: T, samples: usize) -> Vec<Point3<T>> {
        if samples < 2 {
            return vec![self.point_at(start)];
        }
        let step = (end - start) / T::lit((samples - 1) as f64);
        (0..samples)
            .map(|i| self.point_at(start + step * T::lit(i as f64)))
            .collect()
    }

    /// Compute the length of the curve by gauss-legendre quadrature over every knot span
    /// # Example
    /// ```
    /// use topo_blend::prelude::*;
    /// use nalgebra::Point3;
    /// use approx::assert_relative_eq;
    /// let line = NurbsCurve::try_polyline(&[
    ///     Point3::new(0., 0., 0.),
    ///     Point3::new(3., 0., 0.),
    ///     Point3::new(3., 4., 0.),
    /// ]).unwrap();
    /// assert_relative_eq!(line.try_length().unwrap(), 7.0, epsilon = 1e-8);
    /// ```
    pub fn try_length(&self) -> anyhow::Result<T> {
        let gauss = GaussLegendre::init(16 + self.degree);
        let (start, end) = self.knots_domain();
        let spans = self
            .knots
            .as_slice()
            .iter()
            .copied()
            .filter(|k| *k >= start && *k <= end)
            .dedup_by(|a, b| (*a - *b).abs() <= T::default_epsilon())
            .collect_vec();
        anyhow::ensure!(spans.len() >= 2, "Curve has an empty domain");

        let length = spans
            .iter()
            .tuple_windows()
            .map(|(a, b)| {
                let a = a.to_f64().unwrap_or(0.);
                let b = b.to_f64().unwrap_or(0.);
                gauss.integrate(a, b, |x| {
                    self.tangent_at(T::lit(x)).norm().to_f64().unwrap_or(0.)
                })
            })
            .sum::<f64>();
        Ok(T::lit(length))
    }
}

/// Dehomogenize a point
pub fn dehomogenize<T: FloatingPoint>(point: &Point4<T>) -> Point3<T> {
    Point3::from(point.coords.xyz() / point.w)
}

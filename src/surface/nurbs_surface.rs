use gauss_quad::GaussLegendre;
use itertools::Itertools;
use nalgebra::{Point3, Point4, Vector3, Vector4};

use crate::curve::dehomogenize;
use crate::knot::KnotVector;
use crate::misc::FloatingPoint;

/// NURBS surface in 3D space
/// control points are stored with homogeneous coordinates, indexed as `[u][v]`
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NurbsSurface<T: FloatingPoint> {
    control_points: Vec<Vec<Point4<T>>>,
    u_degree: usize,
    v_degree: usize,
    u_knots: KnotVector<T>,
    v_knots: KnotVector<T>,
}

impl<T: FloatingPoint> NurbsSurface<T> {
    /// Create a new NURBS surface
    /// # Failures
    /// - if the control net is not rectangular
    /// - if a knot vector length does not match the control net and degree
    pub fn try_new(
        u_degree: usize,
        v_degree: usize,
        u_knots: Vec<T>,
        v_knots: Vec<T>,
        control_points: Vec<Vec<Point4<T>>>,
    ) -> anyhow::Result<Self> {
        let rows = control_points.len();
        anyhow::ensure!(rows > u_degree, "Too few control points in u direction");
        let columns = control_points[0].len();
        anyhow::ensure!(columns > v_degree, "Too few control points in v direction");
        anyhow::ensure!(
            control_points.iter().all(|row| row.len() == columns),
            "Control net must be rectangular"
        );
        anyhow::ensure!(
            u_knots.len() == rows + u_degree + 1,
            "Invalid number of u knots, got {}, expected {}",
            u_knots.len(),
            rows + u_degree + 1
        );
        anyhow::ensure!(
            v_knots.len() == columns + v_degree + 1,
            "Invalid number of v knots, got {}, expected {}",
            v_knots.len(),
            columns + v_degree + 1
        );

        let u_knots = KnotVector::new(u_knots);
        let v_knots = KnotVector::new(v_knots);
        anyhow::ensure!(
            u_knots.is_non_decreasing() && v_knots.is_non_decreasing(),
            "Knots must be non-decreasing"
        );

        Ok(Self {
            control_points,
            u_degree,
            v_degree,
            u_knots,
            v_knots,
        })
    }

    /// Create a flat rectangular patch spanned by two axes from the origin corner
    pub fn plane(origin: Point3<T>, x_axis: Vector3<T>, y_axis: Vector3<T>) -> Self {
        let lift = |p: Point3<T>| Point4::new(p.x, p.y, p.z, T::one());
        Self {
            control_points: vec![
                vec![lift(origin), lift(origin + y_axis)],
                vec![lift(origin + x_axis), lift(origin + x_axis + y_axis)],
            ],
            u_degree: 1,
            v_degree: 1,
            u_knots: KnotVector::new(vec![T::zero(), T::zero(), T::one(), T::one()]),
            v_knots: KnotVector::new(vec![T::zero(), T::zero(), T::one(), T::one()]),
        }
    }

    pub fn u_degree(&self) -> usize {
        self.u_degree
    }

    pub fn v_degree(&self) -> usize {
        self.v_degree
    }

    pub fn u_knots(&self) -> &KnotVector<T> {
        &self.u_knots
    }

    pub fn v_knots(&self) -> &KnotVector<T> {
        &self.v_knots
    }

    pub fn control_points(&self) -> &[Vec<Point4<T>>] {
        &self.control_points
    }

    /// Get the u & v domains of the knot vectors by degree
    pub fn knots_domain(&self) -> ((T, T), (T, T)) {
        (
            self.u_knots.domain(self.u_degree),
            self.v_knots.domain(self.v_degree),
        )
    }

    /// Evaluate the surface at the given u, v parameters to get a point
    pub fn point_at(&self, u: T, v: T) -> Point3<T> {
        dehomogenize(&self.point(u, v))
    }

    fn point(&self, u: T, v: T) -> Point4<T> {
        let n = self.control_points.len() - 1;
        let m = self.control_points[0].len() - 1;
        let span_u = self.u_knots.find_knot_span_index(n, self.u_degree, u);
        let span_v = self.v_knots.find_knot_span_index(m, self.v_degree, v);
        let basis_u = self.u_knots.basis_functions(span_u, u, self.u_degree);
        let basis_v = self.v_knots.basis_functions(span_v, v, self.v_degree);

        let mut position = Vector4::zeros();
        for (l, bv) in basis_v.iter().enumerate() {
            let vind = span_v - self.v_degree + l;
            let isoline = basis_u
                .iter()
                .enumerate()
                .fold(Vector4::zeros(), |acc, (k, bu)| {
                    acc + self.control_points[span_u - self.u_degree + k][vind].coords * *bu
                });
            position += isoline * *bv;
        }
        Point4::from(position)
    }

    /// Evaluate the rational first derivatives `(S_u, S_v)` at the given parameters
    pub fn rational_derivatives(&self, u: T, v: T) -> (Vector3<T>, Vector3<T>) {
        let n = self.control_points.len() - 1;
        let m = self.control_points[0].len() - 1;
        let span_u = self.u_knots.find_knot_span_index(n, self.u_degree, u);
        let span_v = self.v_knots.find_knot_span_index(m, self.v_degree, v);
        let ders_u =
            self.u_knots
                .derivative_basis_functions(span_u, u, self.u_degree, 1.min(self.u_degree));
        let ders_v =
            self.v_knots
                .derivative_basis_functions(span_v, v, self.v_degree, 1.min(self.v_degree));

        // skl[k][l] is the homogeneous derivative of order k in u and l in v
        let mut skl = [[Vector4::<T>::zeros(); 2]; 2];
        for (k, row_u) in ders_u.iter().enumerate() {
            for (l, row_v) in ders_v.iter().enumerate() {
                if k + l > 1 {
                    continue;
                }
                for i in 0..=self.u_degree {
                    for j in 0..=self.v_degree {
                        let cp = &self.control_points[span_u - self.u_degree + i]
                            [span_v - self.v_degree + j];
                        skl[k][l] += cp.coords * (row_u[i] * row_v[j]);
                    }
                }
            }
        }

        let w = skl[0][0].w;
        let s = skl[0][0].xyz() / w;
        let su = (skl[1][0].xyz() - s * skl[1][0].w) / w;
        let sv = (skl[0][1].xyz() - s * skl[0][1].w) / w;
        (su, sv)
    }

    /// Evaluate the unit normal at the given parameters
    pub fn normal_at(&self, u: T, v: T) -> Vector3<T> {
        let (su, sv) = self.rational_derivatives(u, v);
        su.cross(&sv).normalize()
    }

    /// Compute a regularly spaced grid of points on the surface
    /// the grid has `(divs_u + 1) x (divs_v + 1)` points
    pub fn regular_sample_points(&self, divs_u: usize, divs_v: usize) -> Vec<Vec<Point3<T>>> {
        let ((u0, u1), (v0, v1)) = self.knots_domain();
        let divs_u = divs_u.max(1);
        let divs_v = divs_v.max(1);
        let du = (u1 - u0) / T::lit(divs_u as f64);
        let dv = (v1 - v0) / T::lit(divs_v as f64);
        (0..=divs_u)
            .map(|i| {
                let u = u0 + du * T::lit(i as f64);
                (0..=divs_v)
                    .map(|j| self.point_at(u, v0 + dv * T::lit(j as f64)))
                    .collect()
            })
            .collect()
    }

    /// Compute the area of the surface by nested gauss-legendre quadrature over every knot span
    /// # Example
    /// ```
    /// use topo_blend::prelude::*;
    /// use nalgebra::{Point3, Vector3};
    /// use approx::assert_relative_eq;
    /// let plane = NurbsSurface::plane(Point3::origin(), Vector3::x() * 2., Vector3::y() * 3.);
    /// assert_relative_eq!(plane.try_area().unwrap(), 6.0, epsilon = 1e-8);
    /// ```
    pub fn try_area(&self) -> anyhow::Result<T> {
        let u_spans = distinct_spans(&self.u_knots, self.u_degree);
        let v_spans = distinct_spans(&self.v_knots, self.v_degree);
        anyhow::ensure!(
            u_spans.len() >= 2 && v_spans.len() >= 2,
            "Surface has an empty domain"
        );

        let gauss = GaussLegendre::init(8 + self.u_degree.max(self.v_degree));
        let mut area = 0.;
        for (ua, ub) in u_spans.iter().tuple_windows() {
            for (va, vb) in v_spans.iter().tuple_windows() {
                area += gauss.integrate(*ua, *ub, |u| {
                    gauss.integrate(*va, *vb, |v| {
                        let (su, sv) = self.rational_derivatives(T::lit(u), T::lit(v));
                        su.cross(&sv).norm().to_f64().unwrap_or(0.)
                    })
                });
            }
        }
        Ok(T::lit(area))
    }
}

/// Unique knots inside the domain, as f64 for quadrature
fn distinct_spans<T: FloatingPoint>(knots: &KnotVector<T>, degree: usize) -> Vec<f64> {
    let (start, end) = knots.domain(degree);
    knots
        .as_slice()
        .iter()
        .filter(|k| **k >= start && **k <= end)
        .filter_map(|k| k.to_f64())
        .dedup_by(|a, b| (a - b).abs() <= f64::EPSILON)
        .collect()
}

use std::ops::Index;

use crate::misc::FloatingPoint;

/// Knot vector representation
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnotVector<T>(Vec<T>);

impl<T: FloatingPoint> KnotVector<T> {
    pub fn new(knots: Vec<T>) -> Self {
        Self(knots)
    }

    /// Create a clamped knot vector with `n` control points and a uniform interior
    /// # Failures
    /// - if there are not more control points than the degree
    ///
    /// # Example
    /// ```
    /// use topo_blend::prelude::KnotVector;
    /// let knots: KnotVector<f64> = KnotVector::try_clamped_uniform(4, 2).unwrap();
    /// assert_eq!(knots.to_vec(), vec![0., 0., 0., 1., 2., 2., 2.]);
    /// ```
    pub fn try_clamped_uniform(n: usize, degree: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(
            n > degree,
            "Too few control points ({}) for degree {}",
            n,
            degree
        );
        let spans = n - degree;
        let mut knots = vec![T::zero(); degree + 1];
        knots.extend((1..spans).map(|i| T::lit(i as f64)));
        knots.extend(std::iter::repeat(T::lit(spans as f64)).take(degree + 1));
        Ok(Self(knots))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.0.clone()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    /// Check that the knots never decrease
    pub fn is_non_decreasing(&self) -> bool {
        self.0.windows(2).all(|w| w[0] <= w[1])
    }

    /// Get the domain of the knot vector by degree
    pub fn domain(&self, degree: usize) -> (T, T) {
        (self.0[degree], self.0[self.0.len() - 1 - degree])
    }

    /// Map a normalized parameter in `[0, 1]` onto the domain
    pub fn denormalize(&self, degree: usize, t: T) -> T {
        let (min, max) = self.domain(degree);
        min + (max - min) * t.clamp(T::zero(), T::one())
    }

    /// Find the knot span index by binary search
    /// `n` is the number of control points - 1
    ///
    /// # Example
    /// ```
    /// use topo_blend::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// let idx = knots.find_knot_span_index(4, 2, 2.5);
    /// assert_eq!(idx, 4);
    /// ```
    pub fn find_knot_span_index(&self, n: usize, degree: usize, u: T) -> usize {
        if u >= self[n + 1] {
            return n;
        }
        if u <= self[degree] {
            return degree;
        }

        let mut low = degree;
        let mut high = n + 1;
        let mut mid = (low + high) / 2;
        while u < self[mid] || u >= self[mid + 1] {
            if u < self[mid] {
                high = mid;
            } else {
                low = mid;
            }
            mid = (low + high) / 2;
        }
        mid
    }

    /// Compute the non-vanishing basis functions at `u`
    pub fn basis_functions(&self, span: usize, u: T, degree: usize) -> Vec<T> {
        let mut values = vec![T::zero(); degree + 1];
        let mut left = vec![T::zero(); degree + 1];
        let mut right = vec![T::zero(); degree + 1];
        values[0] = T::one();

        for j in 1..=degree {
            left[j] = u - self[span + 1 - j];
            right[j] = self[span + j] - u;
            let mut saved = T::zero();
            for r in 0..j {
                let temp = values[r] / (right[r + 1] + left[j - r]);
                values[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            values[j] = saved;
        }

        values
    }

    /// Compute the non-vanishing basis functions and their derivatives up to `order`
    /// Row `k` of the result holds the `k`-th derivatives
    pub fn derivative_basis_functions(
        &self,
        span: usize,
        u: T,
        degree: usize,
        order: usize,
    ) -> Vec<Vec<T>> {
        let p = degree;
        let mut ndu = vec![vec![T::zero(); p + 1]; p + 1];
        let mut left = vec![T::zero(); p + 1];
        let mut right = vec![T::zero(); p + 1];
        ndu[0][0] = T::one();

        for j in 1..=p {
            left[j] = u - self[span + 1 - j];
            right[j] = self[span + j] - u;
            let mut saved = T::zero();
            for r in 0..j {
                ndu[j][r] = right[r + 1] + left[j - r];
                let temp = ndu[r][j - 1] / ndu[j][r];
                ndu[r][j] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            ndu[j][j] = saved;
        }

        let mut ders = vec![vec![T::zero(); p + 1]; order + 1];
        for j in 0..=p {
            ders[0][j] = ndu[j][p];
        }

        let p = p as isize;
        for r in 0..=p {
            let mut a = [vec![T::zero(); p as usize + 1], vec![T::zero(); p as usize + 1]];
            let (mut s1, mut s2) = (0, 1);
            a[0][0] = T::one();

            for k in 1..=(order.min(degree) as isize) {
                let mut d = T::zero();
                let rk = r - k;
                let pk = p - k;

                if r >= k {
                    a[s2][0] = a[s1][0] / ndu[(pk + 1) as usize][rk as usize];
                    d = a[s2][0] * ndu[rk as usize][pk as usize];
                }

                let j1 = if rk >= -1 { 1 } else { -rk };
                let j2 = if r - 1 <= pk { k - 1 } else { p - r };
                for j in j1..=j2 {
                    let row = (rk + j) as usize;
                    let j = j as usize;
                    a[s2][j] = (a[s1][j] - a[s1][j - 1]) / ndu[(pk + 1) as usize][row];
                    d += a[s2][j] * ndu[row][pk as usize];
                }

                if r <= pk {
                    a[s2][k as usize] = -a[s1][(k - 1) as usize] / ndu[(pk + 1) as usize][r as usize];
                    d += a[s2][k as usize] * ndu[r as usize][pk as usize];
                }

                ders[k as usize][r as usize] = d;
                std::mem::swap(&mut s1, &mut s2);
            }
        }

        let mut factor = p;
        for k in 1..=order {
            for value in ders[k].iter_mut() {
                *value *= T::lit(factor as f64);
            }
            factor *= p - k as isize;
        }

        ders
    }
}

impl<T> Index<usize> for KnotVector<T> {
    type Output = T;
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> FromIterator<T> for KnotVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

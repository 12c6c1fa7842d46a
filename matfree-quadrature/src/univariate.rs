//! Quadrature rules for the one-dimensional domain `[-1, 1]`.
//!
//! Points are always returned in ascending order.

use crate::{Error, Rule};
use std::f64::consts::PI;

const MAX_NEWTON_ITERATIONS: usize = 100;

/// Recurrence relation for Legendre polynomials.
///
/// Note: we use a formula for which derivatives are *not* defined at |x| == 1, so it is only
/// suitable for evaluation in the open interval (-1, 1).
#[derive(Debug, Default)]
struct LegendreRecurrence {
    n: usize,
    x: f64,
    // The current value, i.e. p_n(x)
    p1: f64,
    // The previous value in the recurrence, i.e. p_{n - 1}(x)
    p2: f64,
}

impl LegendreRecurrence {
    pub fn evaluate(n: usize, x: f64) -> Self {
        // Use recurrence relation
        //  m P_m(x) = (2m - 1) * x P_{m - 1}(x) - (m - 1) P_{m - 2}(x)
        let mut p1 = 1.0;
        let mut p2 = 0.0;
        let mut p3;
        for m in 1..=n {
            let m = m as f64;
            p3 = p2;
            p2 = p1;
            p1 = ((2.0 * m - 1.0) * x * p2 - (m - 1.0) * p3) / m;
        }

        Self { n, x, p1, p2 }
    }

    fn value(&self) -> f64 {
        self.p1
    }

    fn derivative(&self) -> f64 {
        let Self { n, x, p1, p2 } = &self;
        let n = *n as f64;
        // dp_n/dx (x) = n * (x * p_n(x) - p_{n - 1}(x)) / (x^2 - 1)
        n * (x * p1 - p2) / (x * x - 1.0)
    }

    /// Second derivative obtained from the Legendre differential equation
    ///  (1 - x^2) p_n'' - 2 x p_n' + n (n + 1) p_n = 0.
    fn second_derivative(&self) -> f64 {
        let n = self.n as f64;
        let x = self.x;
        (2.0 * x * self.derivative() - n * (n + 1.0) * self.value()) / (1.0 - x * x)
    }

    fn value_and_derivative(&self) -> (f64, f64) {
        (self.value(), self.derivative())
    }
}

/// Gauss quadrature for the reference interval [-1, 1].
///
/// Returns the [Gauss quadrature rule] with the given number of points. Given `n` points,
/// the rule integrates polynomials of order up to `2 n - 1` exactly.
///
/// # Panics
///
/// Panics if zero points are requested.
///
/// [Gauss quadrature rule]: https://en.wikipedia.org/wiki/Gaussian_quadrature
pub fn gauss(num_points: usize) -> Rule<1> {
    try_gauss(num_points).expect("number of points must be positive")
}

/// Fallible version of [`gauss`].
pub fn try_gauss(num_points: usize) -> Result<Rule<1>, Error> {
    let n = num_points;
    if n == 0 {
        return Err(Error::NoRuleAvailable);
    }

    // Loosely based on the procedure used in
    // Numerical Recipes, The art of Scientific Computing, Third Edition (2007)
    let m = (n + 1) / 2;

    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);

    // Only find the first (largest) m roots. The remaining roots follow by symmetry
    for i in 0..m {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let (p, dp) = LegendreRecurrence::evaluate(n, x).value_and_derivative();
            let dx = -p / dp;
            x += dx;
            if dx.abs() <= 1e-15 {
                break;
            }
        }

        // Once a root is known, its corresponding weight is given explicitly by a standard
        // formula
        let dp = LegendreRecurrence::evaluate(n, x).derivative();
        let w = 2.0 / ((1.0 - x * x) * dp * dp);
        points.push([x]);
        weights.push(w);
    }

    for i in m..n {
        let mirror_idx = n - i - 1;
        points.push([-points[mirror_idx][0]]);
        weights.push(weights[mirror_idx]);
    }

    // Roots were produced in descending order
    points.reverse();
    weights.reverse();

    assert_eq!(points.len(), n, "Internal error: incorrect number of points produced");
    Ok((weights, points))
}

/// Gauss-Lobatto quadrature for the reference interval [-1, 1].
///
/// The `n` points consist of the two end points together with the `n - 2` roots of
/// the derivative of the Legendre polynomial of degree `n - 1`. The rule integrates polynomials
/// of order up to `2 n - 3` exactly. Gauss-Lobatto points are the standard choice of nodes for
/// nodal (Lagrange) bases on tensor-product elements.
///
/// # Panics
///
/// Panics if fewer than two points are requested.
pub fn gauss_lobatto(num_points: usize) -> Rule<1> {
    try_gauss_lobatto(num_points).expect("Gauss-Lobatto rules need at least two points")
}

/// Fallible version of [`gauss_lobatto`].
pub fn try_gauss_lobatto(num_points: usize) -> Result<Rule<1>, Error> {
    let n = num_points;
    if n < 2 {
        return Err(Error::NoRuleAvailable);
    }

    // Degree of the Legendre polynomial whose derivative vanishes at the interior points
    let degree = n - 1;
    let endpoint_weight = 2.0 / (degree as f64 * (degree as f64 + 1.0));

    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);
    points.push([-1.0]);
    weights.push(endpoint_weight);

    for i in 1..degree {
        // Chebyshev-Gauss-Lobatto points are close to the Legendre-Gauss-Lobatto points
        let mut x = -(PI * i as f64 / degree as f64).cos();
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let recurrence = LegendreRecurrence::evaluate(degree, x);
            let dx = -recurrence.derivative() / recurrence.second_derivative();
            x += dx;
            if dx.abs() <= 1e-15 {
                break;
            }
        }
        let p = LegendreRecurrence::evaluate(degree, x).value();
        points.push([x]);
        weights.push(endpoint_weight / (p * p));
    }

    points.push([1.0]);
    weights.push(endpoint_weight);

    Ok((weights, points))
}

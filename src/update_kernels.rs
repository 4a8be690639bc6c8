// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use nalgebra::{Matrix2, Vector2};

use crate::core::UNKNOWN_POTENTIAL;
use crate::error::EikonalError;
use crate::mesh::Point;

/// How a vertex is updated from two known neighbours of a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMethod {
    /// Closed-form triangle update after Kimmel and Sethian.
    #[default]
    Sethian,
    /// Plane-wave update solved through the 2x2 Gram matrix of the triangle.
    Matrix,
}

impl fmt::Display for UpdateMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateMethod::Sethian => write!(f, "sethian"),
            UpdateMethod::Matrix => write!(f, "matrix"),
        }
    }
}

impl FromStr for UpdateMethod {
    type Err = EikonalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sethian" => Ok(UpdateMethod::Sethian),
            "matrix" => Ok(UpdateMethod::Matrix),
            other => Err(EikonalError::Other(format!(
                "unknown update method '{}' (expected sethian or matrix)",
                other
            ))),
        }
    }
}

/// A triangle corner as seen by the local update.
#[derive(Debug, Clone, Copy)]
pub struct Corner {
    /// Position of the corner.
    pub position: Point,
    /// Current potential; ignored when not feasible.
    pub potential: f64,
    /// Whether the potential may be used as update input.
    pub feasible: bool,
}

/// Which corners of a triangle an update read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// The two-point update through both corners.
    Both,
    /// One-point estimate from the first corner.
    First,
    /// One-point estimate from the second corner.
    Second,
    /// No corner was usable.
    Neither,
}

/// Travel time to `apex` straight from one known corner.
#[inline]
pub fn one_point(apex: &Point, from: &Point, potential: f64, cost: f64) -> f64 {
    potential + cost * (from - apex).norm()
}

/// Two-point update in the closed form of Kimmel and Sethian.
///
/// `cos_phi` is the cosine of the angle at `apex` and `cost` the time cost
/// (inverse speed) there. The quadratic is solved for `t = T(apex) - min(ta, tb)`;
/// the root is kept only when the characteristic passes through the
/// triangle, otherwise the smaller one-point estimate is returned together
/// with the corner it came from.
pub fn sethian_update(
    apex: &Point,
    pa: &Point,
    pb: &Point,
    ta: f64,
    tb: f64,
    cos_phi: f64,
    cost: f64,
) -> (f64, Support) {
    // Order so that A carries the smaller potential
    let swapped = ta > tb;
    let (ta, tb, pa, pb) = if swapped {
        (tb, ta, pb, pa)
    } else {
        (ta, tb, pa, pb)
    };
    let a = (pb - apex).norm();
    let b = (pa - apex).norm();
    let u = tb - ta;
    let sin_sq = 1.0 - cos_phi * cos_phi;

    let qa = a * a + b * b - 2.0 * a * b * cos_phi;
    let qb = 2.0 * b * u * (a * cos_phi - b);
    let qc = b * b * (u * u - cost * cost * a * a * sin_sq);
    let disc = qb * qb - 4.0 * qa * qc;

    if qa > 0.0 && disc >= 0.0 {
        let t = (-qb + disc.sqrt()) / (2.0 * qa);
        if t > u {
            let ratio = b * (t - u) / t;
            let upper = if cos_phi > 0.0 {
                a / cos_phi
            } else {
                f64::INFINITY
            };
            if a * cos_phi < ratio && ratio < upper {
                return (t + ta, Support::Both);
            }
        }
    }

    let (low, high) = if swapped {
        (Support::Second, Support::First)
    } else {
        (Support::First, Support::Second)
    };
    let via_low = b * cost + ta;
    let via_high = a * cost + tb;
    if via_low <= via_high {
        (via_low, low)
    } else {
        (via_high, high)
    }
}

/// Two-point update from the plane wave through both known corners.
///
/// With `P` holding the edge vectors `A - apex` and `B - apex` as rows and
/// `Q = (P Pᵀ)⁻¹`, solves `1ᵀQ1 T² - 2·1ᵀQt T + tᵀQt - cost² = 0`. The
/// larger root is accepted when it exceeds both inputs and `Q(T·1 - t)` is
/// componentwise non-negative; otherwise the smaller one-point estimate is
/// returned.
pub fn matrix_update(
    apex: &Point,
    pa: &Point,
    pb: &Point,
    ta: f64,
    tb: f64,
    cost: f64,
) -> (f64, Support) {
    let via_a = one_point(apex, pa, ta, cost);
    let via_b = one_point(apex, pb, tb, cost);
    let fallback = if via_a <= via_b {
        (via_a, Support::First)
    } else {
        (via_b, Support::Second)
    };
    let ea = pa - apex;
    let eb = pb - apex;
    let p = Matrix2::new(ea.x, ea.y, eb.x, eb.y);
    let q = match (p * p.transpose()).try_inverse() {
        Some(q) => q,
        None => return fallback,
    };

    let ones = Vector2::new(1.0, 1.0);
    let t = Vector2::new(ta, tb);
    let qa = ones.dot(&(q * ones));
    let qb = -2.0 * ones.dot(&(q * t));
    let qc = t.dot(&(q * t)) - cost * cost;
    let disc = qb * qb - 4.0 * qa * qc;
    if qa <= 0.0 || disc < 0.0 {
        return fallback;
    }

    let root = (-qb + disc.sqrt()) / (2.0 * qa);
    if root <= ta.max(tb) {
        return fallback;
    }
    let direction = q * (ones * root - t);
    if direction.x < 0.0 || direction.y < 0.0 {
        return fallback;
    }
    (root, Support::Both)
}

/// Local update of `apex` from the triangle it spans with corners `a` and `b`.
///
/// Uses the two-point update when both corners are feasible, a one-point
/// estimate when only one is, and [`UNKNOWN_POTENTIAL`] when neither is.
/// The [`Support`] names the corners the returned value was computed from.
pub fn local_update(
    method: UpdateMethod,
    apex: &Point,
    a: Corner,
    b: Corner,
    cos_phi: f64,
    cost: f64,
) -> (f64, Support) {
    match (a.feasible, b.feasible) {
        (true, true) => match method {
            UpdateMethod::Sethian => sethian_update(
                apex,
                &a.position,
                &b.position,
                a.potential,
                b.potential,
                cos_phi,
                cost,
            ),
            UpdateMethod::Matrix => matrix_update(
                apex,
                &a.position,
                &b.position,
                a.potential,
                b.potential,
                cost,
            ),
        },
        (true, false) => (
            one_point(apex, &a.position, a.potential, cost),
            Support::First,
        ),
        (false, true) => (
            one_point(apex, &b.position, b.potential, cost),
            Support::Second,
        ),
        (false, false) => (UNKNOWN_POTENTIAL, Support::Neither),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::cos_angle;

    fn corner(x: f64, y: f64, potential: f64) -> Corner {
        Corner {
            position: Point::new(x, y),
            potential,
            feasible: true,
        }
    }

    fn both(method: UpdateMethod, apex: Point, a: Corner, b: Corner, cost: f64) -> f64 {
        let c = cos_angle(&apex, &a.position, &b.position);
        local_update(method, &apex, a, b, c, cost).0
    }

    #[test]
    fn right_angle_known_case() {
        // Both neighbours at 0 on the unit legs: the front is the line x + y = 1
        let apex = Point::origin();
        for method in [UpdateMethod::Sethian, UpdateMethod::Matrix] {
            let u = both(method, apex, corner(1.0, 0.0, 0.0), corner(0.0, 1.0, 0.0), 1.0);
            assert!(
                (u - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12,
                "{:?} gave {}",
                method,
                u
            );
        }
    }

    #[test]
    fn equilateral_known_case() {
        let apex = Point::origin();
        let a = corner(1.0, 0.0, 0.0);
        let b = corner(0.5, 3.0_f64.sqrt() / 2.0, 0.0);
        for method in [UpdateMethod::Sethian, UpdateMethod::Matrix] {
            let u = both(method, apex, a, b, 1.0);
            assert!((u - 3.0_f64.sqrt() / 2.0).abs() < 1e-12, "{:?} gave {}", method, u);
        }
    }

    #[test]
    fn one_point_fallback_when_wave_misses_triangle() {
        // a=0, b=100: the characteristic comes along edge A, result is 0 + 1 = 1
        let apex = Point::origin();
        for method in [UpdateMethod::Sethian, UpdateMethod::Matrix] {
            let u = both(method, apex, corner(1.0, 0.0, 0.0), corner(0.0, 1.0, 100.0), 1.0);
            assert!((u - 1.0).abs() < 1e-12, "{:?} gave {}", method, u);
        }
    }

    #[test]
    fn fallback_reports_the_corner_it_used() {
        // The wave arrives along the edge to the early corner; the late one
        // must not be reported as an input.
        let apex = Point::origin();
        let early = corner(1.0, 0.0, 0.0);
        let late = corner(0.0, 1.0, 100.0);
        let c = cos_angle(&apex, &early.position, &late.position);
        for method in [UpdateMethod::Sethian, UpdateMethod::Matrix] {
            let (u, support) = local_update(method, &apex, early, late, c, 1.0);
            assert!((u - 1.0).abs() < 1e-12);
            assert_eq!(support, Support::First, "{:?}", method);
            let (u, support) = local_update(method, &apex, late, early, c, 1.0);
            assert!((u - 1.0).abs() < 1e-12);
            assert_eq!(support, Support::Second, "{:?}", method);
        }

        let both_used = local_update(
            UpdateMethod::Sethian,
            &apex,
            corner(1.0, 0.0, 0.0),
            corner(0.0, 1.0, 0.0),
            0.0,
            1.0,
        );
        assert_eq!(both_used.1, Support::Both);
    }

    #[test]
    fn sethian_and_matrix_agree_on_acute_triangles() {
        let apex = Point::new(0.1, -0.2);
        let cases = [
            (corner(1.0, 0.0, 0.0), corner(0.5, 0.866, 0.2), 1.0),
            (corner(1.2, 0.3, 0.7), corner(0.2, 1.1, 0.4), 2.5),
            (corner(0.9, -0.1, 1.0), corner(0.6, 0.8, 1.0), 0.5),
        ];
        for (a, b, cost) in cases {
            let s = both(UpdateMethod::Sethian, apex, a, b, cost);
            let m = both(UpdateMethod::Matrix, apex, a, b, cost);
            assert!((s - m).abs() < 1e-10, "sethian {} vs matrix {}", s, m);
            assert!(s > a.potential.max(b.potential));
        }
    }

    #[test]
    fn update_is_symmetric_in_corners() {
        let apex = Point::origin();
        let a = corner(1.0, 0.0, 0.2);
        let b = corner(0.3, 0.9, 0.5);
        let c = cos_angle(&apex, &a.position, &b.position);
        let (ab, _) = local_update(UpdateMethod::Sethian, &apex, a, b, c, 1.0);
        let (ba, _) = local_update(UpdateMethod::Sethian, &apex, b, a, c, 1.0);
        assert!((ab - ba).abs() < 1e-14);
    }

    #[test]
    fn scales_linearly_with_cost() {
        let apex = Point::origin();
        let a = corner(1.0, 0.0, 0.0);
        let b = corner(0.5, 0.866, 0.0);
        let one = both(UpdateMethod::Sethian, apex, a, b, 1.0);
        let two = both(UpdateMethod::Sethian, apex, a, b, 2.0);
        assert!((two - 2.0 * one).abs() < 1e-12);
    }

    #[test]
    fn feasibility_selects_estimate() {
        let apex = Point::origin();
        let a = corner(2.0, 0.0, 1.0);
        let mut b = corner(0.0, 3.0, 0.0);
        b.feasible = false;
        let (u, support) = local_update(UpdateMethod::Sethian, &apex, a, b, 0.0, 1.0);
        assert!((u - 3.0).abs() < 1e-12);
        assert_eq!(support, Support::First);

        let mut a = a;
        a.feasible = false;
        let u = local_update(UpdateMethod::Matrix, &apex, a, b, 0.0, 1.0);
        assert_eq!(u, (UNKNOWN_POTENTIAL, Support::Neither));
    }

    #[test]
    fn method_names_parse() {
        assert_eq!("sethian".parse::<UpdateMethod>().unwrap(), UpdateMethod::Sethian);
        assert_eq!("Matrix".parse::<UpdateMethod>().unwrap(), UpdateMethod::Matrix);
        assert!("newton".parse::<UpdateMethod>().is_err());
        assert_eq!(UpdateMethod::Matrix.to_string(), "matrix");
    }

    #[test]
    fn no_nan_produced() {
        // Test various edge cases to ensure no NaN
        let apex = Point::origin();
        let cases = [
            (corner(1.0, 0.0, 0.0), corner(0.0, 1.0, 0.0), 1.0),
            (corner(1.0, 0.0, 5.0), corner(0.0, 1.0, 0.0), 1.0),
            (corner(1.0, 0.0, 0.0), corner(1e-9, 1.0, 0.0), 1e-3),
            (corner(1.0, 0.0, 0.0), corner(2.0, 1e-12, 0.0), 1.0),
            (corner(1.0, 0.0, 0.0), corner(-1.0, 0.01, 0.0), 1.0),
            (corner(1.0, 0.0, 0.0), corner(0.5, 0.5, 0.0), 1000.0),
        ];
        for (a, b, cost) in cases {
            for method in [UpdateMethod::Sethian, UpdateMethod::Matrix] {
                let u = both(method, apex, a, b, cost);
                assert!(
                    !u.is_nan() && u >= a.potential.min(b.potential),
                    "bad value {} for {:?} {:?} {:?} cost {}",
                    u,
                    method,
                    a,
                    b,
                    cost
                );
            }
        }
    }
}

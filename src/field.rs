// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::core::UNKNOWN_POTENTIAL;
use crate::mesh::{FaceId, Point, TriangleMesh, VertexId};

/// Barycentric interpolation of vertex potentials over face `f`.
///
/// Returns [`UNKNOWN_POTENTIAL`] when any corner is unknown.
pub fn interpolate<F>(mesh: &TriangleMesh, f: FaceId, p: &Point, potential: F) -> f64
where
    F: Fn(VertexId) -> f64,
{
    let corners = mesh.face_vertices(f);
    let weights = mesh.barycentric(f, p);
    let mut value = 0.0;
    for (v, w) in corners.into_iter().zip(weights) {
        let t = potential(v);
        if t >= UNKNOWN_POTENTIAL {
            return UNKNOWN_POTENTIAL;
        }
        value += w * t;
    }
    value
}

/// Locate `p` starting the walk from the face cached in `hint`, and
/// interpolate there. The hint is updated on success.
pub(crate) fn locate_and_interpolate<F>(
    mesh: &TriangleMesh,
    hint: &AtomicUsize,
    p: &Point,
    potential: F,
) -> f64
where
    F: Fn(VertexId) -> f64,
{
    let start = hint.load(Ordering::Relaxed);
    match mesh.locate_face(p, Some(start)) {
        Some(f) => {
            hint.store(f, Ordering::Relaxed);
            interpolate(mesh, f, p, potential)
        }
        None => UNKNOWN_POTENTIAL,
    }
}

/// Read-only snapshot of a solved potential.
///
/// Holds its own handle to the mesh and a copy of the vertex potentials, so
/// it can be queried from any thread while the solver that produced it keeps
/// running.
#[derive(Debug)]
pub struct PotentialField {
    mesh: Arc<TriangleMesh>,
    potentials: Vec<f64>,
    hint: AtomicUsize,
}

impl PotentialField {
    /// Snapshot of `potentials` over `mesh`.
    pub fn new(mesh: Arc<TriangleMesh>, potentials: Vec<f64>) -> Self {
        PotentialField {
            mesh,
            potentials,
            hint: AtomicUsize::new(0),
        }
    }

    /// Interpolated potential at `(x, y)`, or [`UNKNOWN_POTENTIAL`] outside the
    /// mesh.
    pub fn potential_at(&self, x: f64, y: f64) -> f64 {
        self.potential_at_point(&Point::new(x, y))
    }

    /// Interpolated potential at `p`.
    pub fn potential_at_point(&self, p: &Point) -> f64 {
        locate_and_interpolate(&self.mesh, &self.hint, p, |v| self.potential(v))
    }

    /// Stored potential of a vertex.
    pub fn potential(&self, v: VertexId) -> f64 {
        self.potentials.get(v).copied().unwrap_or(UNKNOWN_POTENTIAL)
    }

    /// All vertex potentials.
    pub fn potentials(&self) -> &[f64] {
        &self.potentials
    }

    /// The mesh the snapshot was taken on.
    pub fn mesh(&self) -> &Arc<TriangleMesh> {
        &self.mesh
    }

    /// Turn the snapshot into a plain query closure.
    pub fn into_fn(self) -> impl Fn(Point) -> f64 + Send + Sync {
        move |p: Point| self.potential_at_point(&p)
    }
}

impl Clone for PotentialField {
    fn clone(&self) -> Self {
        PotentialField {
            mesh: Arc::clone(&self.mesh),
            potentials: self.potentials.clone(),
            hint: AtomicUsize::new(self.hint.load(Ordering::Relaxed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_field() -> PotentialField {
        let mesh = Arc::new(TriangleMesh::rectangle(0.0, 0.0, 1.0, 1.0, 4, 4).unwrap());
        let potentials = mesh.points().iter().map(|p| 2.0 * p.x + p.y).collect();
        PotentialField::new(mesh, potentials)
    }

    #[test]
    fn linear_data_is_reproduced() {
        let field = linear_field();
        for &(x, y) in &[(0.1, 0.2), (0.55, 0.95), (1.0, 0.0), (0.333, 0.777)] {
            let t = field.potential_at(x, y);
            assert!((t - (2.0 * x + y)).abs() < 1e-12, "({}, {}) gave {}", x, y, t);
        }
    }

    #[test]
    fn outside_is_unknown() {
        let field = linear_field();
        assert_eq!(field.potential_at(-0.5, 0.5), UNKNOWN_POTENTIAL);
        assert_eq!(field.potential(1000), UNKNOWN_POTENTIAL);
    }

    #[test]
    fn unknown_corner_poisons_face() {
        let mesh = Arc::new(TriangleMesh::rectangle(0.0, 0.0, 1.0, 1.0, 1, 1).unwrap());
        let mut potentials = vec![0.0; 4];
        potentials[3] = UNKNOWN_POTENTIAL;
        let field = PotentialField::new(mesh, potentials);
        assert_eq!(field.potential_at(0.6, 0.4), UNKNOWN_POTENTIAL);
    }

    #[test]
    fn closure_is_shareable_across_threads() {
        let query = Arc::new(linear_field().into_fn());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let query = Arc::clone(&query);
                std::thread::spawn(move || {
                    let x = 0.2 * i as f64;
                    ((*query)(Point::new(x, 0.5)) - (2.0 * x + 0.5)).abs()
                })
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap() < 1e-12);
        }
    }
}

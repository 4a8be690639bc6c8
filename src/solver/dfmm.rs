// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! Differential Fast Marching: replay the unaffected prefix of the previous
//! visiting order, then march the rest.

use crate::core::VertexState;
use crate::mesh::VertexId;

use super::fmm::{march, seed_band, NarrowBand};
use super::ifim::changed_vertices;
use super::{Relaxation, Snapshot};

/// Result of a differential re-solve.
#[derive(Debug)]
pub(crate) struct Redo {
    pub(crate) order: Vec<VertexId>,
    pub(crate) invalidated: usize,
    pub(crate) reused: usize,
}

/// Lowest old potential among the changed vertices and every vertex their
/// updates read.
///
/// Vertices frozen below this value cannot see a changed cost, so their old
/// potentials stay exact.
fn reuse_bound(relax: &Relaxation<'_>, snapshot: &Snapshot, changed: &[VertexId]) -> f64 {
    let old = |v: VertexId| snapshot.potential.get(v).copied().unwrap_or(f64::NEG_INFINITY);
    let mut bound = f64::INFINITY;
    for &x in changed {
        bound = bound.min(old(x));
        for p in relax.update_partners(x) {
            bound = bound.min(old(p));
        }
    }
    bound
}

/// Re-solve after time-cost changes.
///
/// Every non-initial vertex is invalidated, then the previous order is
/// replayed from the front: a vertex is re-frozen with its old potential and
/// simplex while its cost is unchanged and its old potential is below
/// [`reuse_bound`]. The narrow band is rebuilt around that prefix and marching
/// finishes the solve.
pub(crate) fn resolve(relax: &Relaxation<'_>, snapshot: &Snapshot, cost_epsilon: f64) -> Redo {
    let attrs = relax.attributes;
    let n = attrs.len();
    let changed = changed_vertices(attrs, snapshot, cost_epsilon);
    if changed.is_empty() {
        return Redo {
            order: snapshot.order.clone(),
            invalidated: 0,
            reused: n,
        };
    }

    let bound = reuse_bound(relax, snapshot, &changed);
    let mut is_changed = vec![false; n];
    for &v in &changed {
        is_changed[v] = true;
    }

    let mut sources = 0;
    for v in 0..n {
        if attrs.is_initial(v) {
            sources += 1;
        } else {
            attrs.invalidate(v);
        }
    }

    let mut order = Vec::with_capacity(n);
    let mut reused = 0;
    for &v in &snapshot.order {
        if v >= n {
            break;
        }
        if attrs.is_initial(v) {
            order.push(v);
            continue;
        }
        let old = snapshot.potential[v];
        if is_changed[v] || old >= bound {
            break;
        }
        attrs.set_potential(v, old);
        attrs.set_simplex(v, snapshot.simplex[v]);
        attrs.set_state(v, VertexState::Frozen);
        order.push(v);
        reused += 1;
    }

    let mut band = NarrowBand::new();
    seed_band(relax, &mut band, order.iter().copied());
    march(relax, &mut band, &mut order);

    Redo {
        order,
        invalidated: n - sources - reused,
        reused,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Attributes;
    use crate::geometry::{EdgeGeometry, DEFAULT_SUPPORT_DEPTH};
    use crate::mesh::{Point, TriangleMesh};
    use crate::scheduler::ClaimFlags;
    use crate::solver::{fmm, Feasibility};
    use crate::update_kernels::UpdateMethod;

    struct Fixture {
        mesh: TriangleMesh,
        geometry: EdgeGeometry,
        claims: ClaimFlags,
    }

    impl Fixture {
        fn new(mesh: TriangleMesh) -> Self {
            let geometry = EdgeGeometry::build(&mesh, DEFAULT_SUPPORT_DEPTH);
            let claims = ClaimFlags::new(mesh.vertex_count());
            Fixture {
                mesh,
                geometry,
                claims,
            }
        }

        fn relax<'a>(&'a self, attrs: &'a Attributes) -> Relaxation<'a> {
            Relaxation::new(
                &self.mesh,
                &self.geometry,
                attrs,
                &self.claims,
                UpdateMethod::Sethian,
                Feasibility::Frozen,
                0.0,
                false,
            )
        }

        fn attributes(&self, cost: impl Fn(Point) -> f64) -> Attributes {
            let n = self.mesh.vertex_count();
            let mut attrs = Attributes::new(n);
            for v in 0..n {
                attrs.set_time_cost(v, cost(self.mesh.position(v)));
            }
            attrs.set_potential(0, 0.0);
            attrs.set_state(0, VertexState::Initial);
            attrs
        }

        fn full(&self, cost: impl Fn(Point) -> f64) -> (Attributes, Snapshot) {
            let attrs = self.attributes(cost);
            let order = fmm::solve(&self.relax(&attrs), &[0]);
            let snapshot = Snapshot {
                order,
                potential: attrs.potentials(),
                time_cost: attrs.time_costs().to_vec(),
                simplex: (0..attrs.len()).map(|v| attrs.simplex(v)).collect(),
            };
            (attrs, snapshot)
        }
    }

    fn bump(p: Point) -> f64 {
        if (p.x - 0.7).abs() < 0.15 && (p.y - 0.6).abs() < 0.15 {
            3.0
        } else {
            1.0
        }
    }

    #[test]
    fn resolve_matches_full_march() {
        let fx = Fixture::new(TriangleMesh::rectangle(0.0, 0.0, 1.0, 1.0, 12, 12).unwrap());
        let (mut attrs, snapshot) = fx.full(|_| 1.0);
        let n = attrs.len();
        for v in 0..n {
            attrs.set_time_cost(v, bump(fx.mesh.position(v)));
        }

        let redo = resolve(&fx.relax(&attrs), &snapshot, 1e-12);
        assert!(redo.reused > 0, "nothing near the source should move");
        assert!(redo.invalidated > 0);
        assert_eq!(redo.order.len(), n);
        assert_eq!(redo.order[0], 0);

        let (reference, _) = fx.full(bump);
        for v in 0..n {
            let (a, b) = (attrs.potential(v), reference.potential(v));
            assert!((a - b).abs() < 1e-10, "vertex {}: {} vs {}", v, a, b);
        }
        for pair in redo.order.windows(2) {
            assert!(attrs.potential(pair[0]) <= attrs.potential(pair[1]));
        }
    }

    #[test]
    fn prefix_stops_below_changed_region() {
        let fx = Fixture::new(TriangleMesh::rectangle(0.0, 0.0, 1.0, 1.0, 8, 8).unwrap());
        let (mut attrs, snapshot) = fx.full(|_| 1.0);
        // Vertex 40 is the centre of the 9-wide grid.
        attrs.set_time_cost(40, 0.25);
        let relax = fx.relax(&attrs);
        let bound = reuse_bound(&relax, &snapshot, &[40]);
        let redo = resolve(&relax, &snapshot, 1e-12);
        for &v in &redo.order[1..=redo.reused] {
            assert!(snapshot.potential[v] < bound);
            assert_eq!(attrs.potential(v), snapshot.potential[v]);
        }
        assert!(redo.reused > 0);
        assert!(attrs.potential(40) < snapshot.potential[40]);
    }

    #[test]
    fn unchanged_costs_keep_everything() {
        let fx = Fixture::new(TriangleMesh::rectangle(0.0, 0.0, 1.0, 1.0, 4, 4).unwrap());
        let (attrs, snapshot) = fx.full(|_| 1.0);
        let redo = resolve(&fx.relax(&attrs), &snapshot, 1e-12);
        assert_eq!(redo.order, snapshot.order);
        assert_eq!(redo.invalidated, 0);
        assert_eq!(attrs.potentials(), snapshot.potential);
    }
}

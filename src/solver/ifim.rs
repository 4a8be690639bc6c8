// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! Informed FIM: re-solve only what a time-cost change can reach.

use smallvec::SmallVec;
use std::collections::VecDeque;

use crate::core::Attributes;
use crate::error::Result;
use crate::mesh::VertexId;
use crate::scheduler::{run_passes, PassConfig};

use super::fim::{check_neighbor, relax_list, RelaxPolicy};
use super::{Relaxation, Snapshot};

/// Defers vertices whose defining simplex is still moving, and skips
/// neighbour checks that cannot change anything.
struct Informed<'s> {
    old_potential: &'s [f64],
    invalidated: &'s [bool],
    tolerance: f64,
}

impl RelaxPolicy for Informed<'_> {
    fn is_ready(&self, relax: &Relaxation<'_>, v: VertexId) -> bool {
        relax
            .attributes
            .simplex(v)
            .vertices()
            .all(|u| relax.attributes.is_frozen(u))
    }

    fn should_check(&self, relax: &Relaxation<'_>, v: VertexId, n: VertexId) -> bool {
        // A neighbour that kept its old value was computed from the old value
        // of `v`; it only needs a look if `v` moved.
        self.invalidated[n]
            || (relax.attributes.potential(v) - self.old_potential[v]).abs() > self.tolerance
    }
}

/// Summary of an incremental re-solve.
#[derive(Debug, Default)]
pub(crate) struct IncrementalOutcome {
    pub(crate) passes: u64,
    pub(crate) invalidated: usize,
    pub(crate) reused: usize,
}

/// Vertices whose time cost moved by more than `cost_epsilon` since the
/// snapshot. Initial vertices never count.
pub(crate) fn changed_vertices(
    attrs: &Attributes,
    snapshot: &Snapshot,
    cost_epsilon: f64,
) -> Vec<VertexId> {
    (0..attrs.len())
        .filter(|&v| {
            !attrs.is_initial(v)
                && snapshot
                    .time_cost
                    .get(v)
                    .map_or(true, |&old| (attrs.time_cost(v) - old).abs() > cost_epsilon)
        })
        .collect()
}

/// Changed vertices plus everything whose defining simplex leads to one.
fn dependents_closure(attrs: &Attributes, snapshot: &Snapshot, changed: &[VertexId]) -> Vec<bool> {
    let n = attrs.len();
    let mut dependents: Vec<SmallVec<[VertexId; 4]>> = vec![SmallVec::new(); n];
    for (v, simplex) in snapshot.simplex.iter().enumerate() {
        for u in simplex.vertices() {
            if u < n {
                dependents[u].push(v);
            }
        }
    }

    let mut marked = vec![false; n];
    let mut queue: VecDeque<VertexId> = VecDeque::with_capacity(changed.len());
    for &v in changed {
        if !marked[v] {
            marked[v] = true;
            queue.push_back(v);
        }
    }
    while let Some(u) = queue.pop_front() {
        for &v in &dependents[u] {
            if !marked[v] && !attrs.is_initial(v) {
                marked[v] = true;
                queue.push_back(v);
            }
        }
    }
    marked
}

/// Re-solve after time-cost changes, keeping every value that does not
/// depend on a changed vertex.
///
/// The attributes must hold the solution recorded in `snapshot`, with the
/// new time costs already sampled.
pub(crate) fn resolve(
    relax: &Relaxation<'_>,
    snapshot: &Snapshot,
    config: &PassConfig<'_>,
    cost_epsilon: f64,
) -> Result<IncrementalOutcome> {
    let attrs = relax.attributes;
    let n = attrs.len();
    let changed = changed_vertices(attrs, snapshot, cost_epsilon);
    if changed.is_empty() {
        return Ok(IncrementalOutcome {
            passes: 0,
            invalidated: 0,
            reused: n,
        });
    }

    let invalidated = dependents_closure(attrs, snapshot, &changed);
    let count = invalidated.iter().filter(|&&b| b).count();
    for v in (0..n).filter(|&v| invalidated[v]) {
        attrs.invalidate(v);
    }
    tracing::debug!(
        changed = changed.len(),
        invalidated = count,
        "ifim invalidated dependents"
    );

    let mut seeds = Vec::new();
    for v in (0..n).filter(|&v| invalidated[v]) {
        check_neighbor(relax, v, &mut seeds);
    }

    let policy = Informed {
        old_potential: &snapshot.potential,
        invalidated: &invalidated,
        tolerance: relax.tolerance,
    };
    let passes = run_passes(config, seeds, |list, force| {
        relax_list(relax, list, force, &policy)
    })?;

    Ok(IncrementalOutcome {
        passes,
        invalidated: count,
        reused: n - count,
    })
}

/// Whether the defining simplices form a cycle.
///
/// Iterative depth-first search over the edges `v -> u` for every `u` in the
/// simplex of `v`.
pub(crate) fn has_cycle(attrs: &Attributes) -> bool {
    const WHITE: u8 = 0;
    const GREY: u8 = 1;
    const BLACK: u8 = 2;

    let n = attrs.len();
    let mut color = vec![WHITE; n];
    let mut stack: Vec<(VertexId, SmallVec<[VertexId; 2]>)> = Vec::new();
    for root in 0..n {
        if color[root] != WHITE {
            continue;
        }
        color[root] = GREY;
        stack.push((root, attrs.simplex(root).vertices().collect()));
        while let Some((v, pending)) = stack.last_mut() {
            match pending.pop() {
                Some(u) if u < n => match color[u] {
                    GREY => return true,
                    WHITE => {
                        color[u] = GREY;
                        let next = attrs.simplex(u).vertices().collect();
                        stack.push((u, next));
                    }
                    _ => {}
                },
                Some(_) => {}
                None => {
                    color[*v] = BLACK;
                    stack.pop();
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DefiningSimplex, VertexState, UNKNOWN_POTENTIAL};
    use crate::geometry::{EdgeGeometry, DEFAULT_SUPPORT_DEPTH};
    use crate::mesh::TriangleMesh;
    use crate::scheduler::ClaimFlags;
    use crate::solver::{fim, Feasibility};
    use crate::update_kernels::UpdateMethod;

    fn config() -> PassConfig<'static> {
        PassConfig {
            threads: 1,
            max_passes: 10_000,
            seed: 0,
            progress: None,
        }
    }

    fn snapshot(attrs: &Attributes) -> Snapshot {
        Snapshot {
            order: Vec::new(),
            potential: attrs.potentials(),
            time_cost: attrs.time_costs().to_vec(),
            simplex: (0..attrs.len()).map(|v| attrs.simplex(v)).collect(),
        }
    }

    #[test]
    fn cycle_detection() {
        let attrs = Attributes::new(4);
        attrs.set_simplex(1, DefiningSimplex::Point(0));
        attrs.set_simplex(2, DefiningSimplex::Edge(0, 1));
        attrs.set_simplex(3, DefiningSimplex::Edge(1, 2));
        assert!(!has_cycle(&attrs));
        attrs.set_simplex(0, DefiningSimplex::Point(3));
        assert!(has_cycle(&attrs));
    }

    #[test]
    fn closure_follows_simplices() {
        let mut attrs = Attributes::new(5);
        attrs.set_state(0, VertexState::Initial);
        attrs.set_simplex(1, DefiningSimplex::Point(0));
        attrs.set_simplex(2, DefiningSimplex::Edge(0, 1));
        attrs.set_simplex(3, DefiningSimplex::Point(0));
        attrs.set_simplex(4, DefiningSimplex::Edge(2, 3));
        let snap = snapshot(&attrs);
        attrs.set_time_cost(1, 3.0);
        attrs.set_time_cost(0, 3.0);

        let changed = changed_vertices(&attrs, &snap, 1e-12);
        assert_eq!(changed, vec![1], "initial vertex changes are ignored");
        let marked = dependents_closure(&attrs, &snap, &changed);
        assert_eq!(marked, vec![false, true, true, false, true]);
    }

    #[test]
    fn incremental_matches_full_solve() {
        let mesh = TriangleMesh::rectangle(0.0, 0.0, 1.0, 1.0, 10, 10).unwrap();
        let geometry = EdgeGeometry::build(&mesh, DEFAULT_SUPPORT_DEPTH);
        let n = mesh.vertex_count();
        let claims = ClaimFlags::new(n);

        let solve_with = |attrs: &Attributes| {
            let relax = Relaxation::new(
                &mesh,
                &geometry,
                attrs,
                &claims,
                UpdateMethod::Sethian,
                Feasibility::Known,
                0.0,
                false,
            );
            fim::solve(&relax, &[0], &config(), &fim::Plain).unwrap();
        };
        let fresh = |costs: &dyn Fn(VertexId) -> f64| {
            let mut attrs = Attributes::new(n);
            for v in 0..n {
                attrs.set_time_cost(v, costs(v));
            }
            attrs.set_potential(0, 0.0);
            attrs.set_state(0, VertexState::Initial);
            attrs
        };
        // A slow patch in the middle of the square, then a faster one.
        let slow = |v: VertexId| if (44..=46).contains(&v) { 4.0 } else { 1.0 };
        let fast = |v: VertexId| if (44..=46).contains(&v) { 0.5 } else { 1.0 };

        for changed_cost in [&slow as &dyn Fn(VertexId) -> f64, &fast] {
            let mut attrs = fresh(&|_: VertexId| 1.0);
            solve_with(&attrs);
            let snap = snapshot(&attrs);
            for v in 0..n {
                attrs.set_time_cost(v, changed_cost(v));
            }
            let relax = Relaxation::new(
                &mesh,
                &geometry,
                &attrs,
                &claims,
                UpdateMethod::Sethian,
                Feasibility::Known,
                0.0,
                false,
            );
            let outcome = resolve(&relax, &snap, &config(), 1e-12).unwrap();
            assert!(outcome.invalidated > 0 && outcome.reused > 0);

            let reference = fresh(changed_cost);
            solve_with(&reference);
            for v in 0..n {
                let (a, b) = (attrs.potential(v), reference.potential(v));
                assert!(a < UNKNOWN_POTENTIAL);
                assert!((a - b).abs() < 1e-9, "vertex {}: {} vs {}", v, a, b);
                assert!(!claims.is_claimed(v));
            }
            assert!(!has_cycle(&attrs));
        }
    }

    #[test]
    fn unchanged_costs_do_nothing() {
        let attrs = Attributes::new(4);
        let snap = snapshot(&attrs);
        let mesh = TriangleMesh::rectangle(0.0, 0.0, 1.0, 1.0, 1, 1).unwrap();
        let geometry = EdgeGeometry::build(&mesh, DEFAULT_SUPPORT_DEPTH);
        let claims = ClaimFlags::new(4);
        let relax = Relaxation::new(
            &mesh,
            &geometry,
            &attrs,
            &claims,
            UpdateMethod::Sethian,
            Feasibility::Known,
            0.0,
            false,
        );
        let outcome = resolve(&relax, &snap, &config(), 0.0).unwrap();
        assert_eq!(outcome.passes, 0);
        assert_eq!(outcome.reused, 4);
    }
}

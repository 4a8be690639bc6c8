// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! Fast Iterative Method over active lists, serial or lock-free parallel.

use crate::core::VertexState;
use crate::error::Result;
use crate::mesh::VertexId;
use crate::scheduler::{run_passes, ListOutcome, PassConfig};

use super::Relaxation;

/// Hooks that let the informed variant defer or skip work.
pub(crate) trait RelaxPolicy: Sync {
    /// Whether `v` may be recomputed in this pass.
    fn is_ready(&self, _relax: &Relaxation<'_>, _v: VertexId) -> bool {
        true
    }

    /// Whether converged vertex `v` should re-examine neighbour `n`.
    fn should_check(&self, _relax: &Relaxation<'_>, _v: VertexId, _n: VertexId) -> bool {
        true
    }
}

/// Plain FIM: everything is ready, every neighbour is checked.
pub(crate) struct Plain;

impl RelaxPolicy for Plain {}

/// Recompute `n` after a neighbour converged and activate it if it improved.
///
/// The improved vertex goes to `next` if this caller wins its claim. If
/// another list owns it, the owner is told to process it again.
pub(crate) fn check_neighbor(relax: &Relaxation<'_>, n: VertexId, next: &mut Vec<VertexId>) {
    let attrs = relax.attributes;
    let claims = relax.claims;
    if attrs.is_initial(n) {
        return;
    }
    // Single-threaded, an owned vertex is still waiting in a list and will
    // see the new value when its turn comes.
    if !relax.concurrent && claims.is_claimed(n) {
        return;
    }

    let (value, simplex) = relax.recompute(n);
    if !attrs.update_potential(n, value) {
        return;
    }
    attrs.set_simplex(n, simplex);
    loop {
        if claims.try_claim(n) {
            attrs.set_state(n, VertexState::Active);
            next.push(n);
            return;
        }
        if claims.mark_dirty(n) {
            return;
        }
    }
}

/// One pass over an active list.
pub(crate) fn relax_list<P: RelaxPolicy>(
    relax: &Relaxation<'_>,
    list: Vec<VertexId>,
    force: bool,
    policy: &P,
) -> ListOutcome {
    let attrs = relax.attributes;
    let claims = relax.claims;
    let mut next = Vec::with_capacity(list.len());
    let mut progressed = false;
    let mut deferred = 0usize;

    for v in list {
        if !force && !policy.is_ready(relax, v) {
            deferred += 1;
            next.push(v);
            continue;
        }
        progressed = true;

        let old = attrs.potential(v);
        let (value, simplex) = relax.recompute(v);
        if value <= old {
            attrs.update_potential(v, value);
            attrs.set_simplex(v, simplex);
        }
        if old - value > relax.tolerance {
            next.push(v);
            continue;
        }

        for n in relax.neighbors(v) {
            if policy.should_check(relax, v, n) {
                check_neighbor(relax, n, &mut next);
            }
        }
        attrs.set_state(v, VertexState::Frozen);
        if !claims.try_release(v) {
            attrs.set_state(v, VertexState::Active);
            next.push(v);
        }
    }

    if deferred > 0 {
        tracing::debug!(deferred, "vertices waiting on their defining simplex");
    }
    ListOutcome { next, progressed }
}

/// Activate the neighbours of the given frozen vertices. Returns the seeds.
pub(crate) fn seed_neighbors<I>(relax: &Relaxation<'_>, frozen: I) -> Vec<VertexId>
where
    I: IntoIterator<Item = VertexId>,
{
    let mut seeds = Vec::new();
    for v in frozen {
        for n in relax.neighbors(v) {
            check_neighbor(relax, n, &mut seeds);
        }
    }
    seeds
}

/// Full solve from the initial vertices. Returns the number of passes.
pub(crate) fn solve<P: RelaxPolicy>(
    relax: &Relaxation<'_>,
    initial: &[VertexId],
    config: &PassConfig<'_>,
    policy: &P,
) -> Result<u64> {
    let seeds = seed_neighbors(relax, initial.iter().copied());
    run_passes(config, seeds, |list, force| {
        relax_list(relax, list, force, policy)
    })
}

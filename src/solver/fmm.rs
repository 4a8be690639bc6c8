// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! Serial Fast Marching: vertices are frozen in increasing potential order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::VertexState;
use crate::mesh::VertexId;

use super::Relaxation;

#[derive(Debug, Clone, Copy)]
struct BandEntry {
    potential: f64,
    vertex: VertexId,
}

impl PartialEq for BandEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BandEntry {}

impl PartialOrd for BandEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BandEntry {
    // Reversed so the max-heap pops the smallest potential first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .potential
            .total_cmp(&self.potential)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

/// Min-heap narrow band with lazy deletion.
///
/// Lowering a vertex pushes a fresh entry; entries whose potential no longer
/// matches the vertex, or whose vertex is not active any more, are skipped
/// when popped.
#[derive(Debug, Default)]
pub(crate) struct NarrowBand {
    heap: BinaryHeap<BandEntry>,
}

impl NarrowBand {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, vertex: VertexId, potential: f64) {
        self.heap.push(BandEntry { potential, vertex });
    }

    pub(crate) fn pop(&mut self, relax: &Relaxation<'_>) -> Option<VertexId> {
        while let Some(entry) = self.heap.pop() {
            let attrs = relax.attributes;
            if attrs.is_active(entry.vertex) && attrs.potential(entry.vertex) == entry.potential {
                return Some(entry.vertex);
            }
        }
        None
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.heap.len()
    }
}

/// Recompute a non-frozen vertex and put it in the band if it improved.
pub(crate) fn relax_vertex(relax: &Relaxation<'_>, band: &mut NarrowBand, v: VertexId) {
    let attrs = relax.attributes;
    let (value, simplex) = relax.recompute(v);
    if value < attrs.potential(v) {
        attrs.set_potential(v, value);
        attrs.set_simplex(v, simplex);
        attrs.set_state(v, VertexState::Active);
        band.push(v, value);
    }
}

/// Put the non-frozen neighbours of every vertex in `frozen` into the band.
pub(crate) fn seed_band<I>(relax: &Relaxation<'_>, band: &mut NarrowBand, frozen: I)
where
    I: IntoIterator<Item = VertexId>,
{
    for v in frozen {
        for n in relax.neighbors(v) {
            if !relax.attributes.is_frozen(n) {
                relax_vertex(relax, band, n);
            }
        }
    }
}

/// Pop and freeze until the band is empty, appending to `order`.
pub(crate) fn march(relax: &Relaxation<'_>, band: &mut NarrowBand, order: &mut Vec<VertexId>) {
    let attrs = relax.attributes;
    while let Some(v) = band.pop(relax) {
        attrs.set_state(v, VertexState::Frozen);
        order.push(v);
        for n in relax.neighbors(v) {
            if !attrs.is_frozen(n) {
                relax_vertex(relax, band, n);
            }
        }
    }
}

/// Full solve from the initial vertices. Returns the visiting order, initial
/// vertices first.
pub(crate) fn solve(relax: &Relaxation<'_>, initial: &[VertexId]) -> Vec<VertexId> {
    let mut order = Vec::with_capacity(relax.attributes.len());
    order.extend_from_slice(initial);
    let mut band = NarrowBand::new();
    seed_band(relax, &mut band, initial.iter().copied());
    march(relax, &mut band, &mut order);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Attributes;
    use crate::geometry::{EdgeGeometry, DEFAULT_SUPPORT_DEPTH};
    use crate::mesh::TriangleMesh;
    use crate::scheduler::ClaimFlags;
    use crate::solver::Feasibility;
    use crate::update_kernels::UpdateMethod;

    #[test]
    fn band_pops_in_increasing_order_and_skips_stale() {
        let mesh = TriangleMesh::rectangle(0.0, 0.0, 1.0, 1.0, 1, 1).unwrap();
        let geometry = EdgeGeometry::build(&mesh, DEFAULT_SUPPORT_DEPTH);
        let attributes = Attributes::new(4);
        let claims = ClaimFlags::new(4);
        let relax = Relaxation::new(
            &mesh,
            &geometry,
            &attributes,
            &claims,
            UpdateMethod::Sethian,
            Feasibility::Frozen,
            0.0,
            false,
        );

        let mut band = NarrowBand::new();
        for (v, t) in [(1, 3.0), (2, 1.0), (3, 2.0)] {
            attributes.set_potential(v, t);
            attributes.set_state(v, VertexState::Active);
            band.push(v, t);
        }
        // Lower vertex 1 below the others; its old entry becomes stale.
        attributes.set_potential(1, 0.5);
        band.push(1, 0.5);
        assert_eq!(band.len(), 4);

        assert_eq!(band.pop(&relax), Some(1));
        attributes.set_state(1, VertexState::Frozen);
        assert_eq!(band.pop(&relax), Some(2));
        attributes.set_state(2, VertexState::Frozen);
        assert_eq!(band.pop(&relax), Some(3));
        attributes.set_state(3, VertexState::Frozen);
        assert_eq!(band.pop(&relax), None);
    }

    #[test]
    fn order_is_non_decreasing() {
        let mesh = TriangleMesh::rectangle(0.0, 0.0, 1.0, 1.0, 6, 6).unwrap();
        let geometry = EdgeGeometry::build(&mesh, DEFAULT_SUPPORT_DEPTH);
        let attributes = Attributes::new(mesh.vertex_count());
        let claims = ClaimFlags::new(mesh.vertex_count());
        attributes.set_potential(0, 0.0);
        attributes.set_state(0, VertexState::Initial);
        let relax = Relaxation::new(
            &mesh,
            &geometry,
            &attributes,
            &claims,
            UpdateMethod::Sethian,
            Feasibility::Frozen,
            0.0,
            false,
        );

        let order = solve(&relax, &[0]);
        assert_eq!(order.len(), mesh.vertex_count());
        assert_eq!(order[0], 0);
        for pair in order.windows(2) {
            assert!(attributes.potential(pair[0]) <= attributes.potential(pair[1]));
        }
        for v in 1..mesh.vertex_count() {
            assert_eq!(attributes.state(v), VertexState::Frozen);
        }
    }
}

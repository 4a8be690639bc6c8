// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::mesh::VertexId;

/// Potential of a vertex that has not been reached.
pub const UNKNOWN_POTENTIAL: f64 = f64::MAX;

const NO_VERTEX: u64 = u32::MAX as u64;

/// Vertex ids must stay below this bound to fit a packed simplex.
pub const MAX_VERTICES: usize = u32::MAX as usize;

/// Lifecycle of a vertex during a solve. A vertex is in exactly one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VertexState {
    /// Not reached yet; potential is [`UNKNOWN_POTENTIAL`].
    Unknown = 0,
    /// In the narrow band / an active list with a tentative potential.
    Active = 1,
    /// Final for this solve.
    Frozen = 2,
    /// Source vertex with a potential fixed by the distance function.
    Initial = 3,
}

impl VertexState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => VertexState::Active,
            2 => VertexState::Frozen,
            3 => VertexState::Initial,
            _ => VertexState::Unknown,
        }
    }
}

/// The neighbours whose potentials produced a vertex's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefiningSimplex {
    /// No value yet, or a source vertex.
    #[default]
    None,
    /// One-point estimate from a single neighbour.
    Point(VertexId),
    /// Two-point update across the segment between two vertices.
    Edge(VertexId, VertexId),
}

impl DefiningSimplex {
    fn pack(self) -> u64 {
        debug_assert!(
            self.vertices().all(|v| v < MAX_VERTICES),
            "vertex id does not fit a packed simplex: {:?}",
            self
        );
        let (a, b) = match self {
            DefiningSimplex::None => (NO_VERTEX, NO_VERTEX),
            DefiningSimplex::Point(a) => (a as u64, NO_VERTEX),
            DefiningSimplex::Edge(a, b) => (a as u64, b as u64),
        };
        (a << 32) | b
    }

    fn unpack(bits: u64) -> Self {
        let a = bits >> 32;
        let b = bits & NO_VERTEX;
        match (a == NO_VERTEX, b == NO_VERTEX) {
            (true, _) => DefiningSimplex::None,
            (false, true) => DefiningSimplex::Point(a as VertexId),
            (false, false) => DefiningSimplex::Edge(a as VertexId, b as VertexId),
        }
    }

    /// Vertices of the simplex.
    pub fn vertices(self) -> impl Iterator<Item = VertexId> {
        let (a, b) = match self {
            DefiningSimplex::None => (None, None),
            DefiningSimplex::Point(a) => (Some(a), None),
            DefiningSimplex::Edge(a, b) => (Some(a), Some(b)),
        };
        a.into_iter().chain(b)
    }
}

/// Per-vertex solver state stored as a struct of arrays.
///
/// Potentials, states and defining simplices are atomics so the lock-free
/// parallel variants can share one instance across workers; the serial
/// variants use the same storage with relaxed ordering.
pub struct Attributes {
    potential: Vec<AtomicU64>,
    state: Vec<AtomicU8>,
    simplex: Vec<AtomicU64>,
    time_cost: Vec<f64>,
}

impl Attributes {
    /// Attributes for `n` vertices, all unknown.
    pub fn new(n: usize) -> Self {
        let mut attributes = Attributes {
            potential: Vec::new(),
            state: Vec::new(),
            simplex: Vec::new(),
            time_cost: Vec::new(),
        };
        attributes.resize(n);
        attributes
    }

    /// Number of vertices tracked.
    pub fn len(&self) -> usize {
        self.potential.len()
    }

    /// Whether no vertices are tracked.
    pub fn is_empty(&self) -> bool {
        self.potential.is_empty()
    }

    /// Grow (or shrink) to `n` vertices; new vertices start unknown.
    pub fn resize(&mut self, n: usize) {
        self.potential
            .resize_with(n, || AtomicU64::new(UNKNOWN_POTENTIAL.to_bits()));
        self.state
            .resize_with(n, || AtomicU8::new(VertexState::Unknown as u8));
        self.simplex
            .resize_with(n, || AtomicU64::new(DefiningSimplex::None.pack()));
        self.time_cost.resize(n, 1.0);
    }

    /// Forget every potential, state and simplex. Time costs are kept.
    pub fn reset(&mut self) {
        for v in 0..self.len() {
            self.invalidate(v);
        }
    }

    /// Return one vertex to the unknown state.
    pub fn invalidate(&self, v: VertexId) {
        self.set_potential(v, UNKNOWN_POTENTIAL);
        self.set_state(v, VertexState::Unknown);
        self.set_simplex(v, DefiningSimplex::None);
    }

    /// Current potential.
    pub fn potential(&self, v: VertexId) -> f64 {
        f64::from_bits(self.potential[v].load(Ordering::Acquire))
    }

    /// Overwrite the potential.
    pub fn set_potential(&self, v: VertexId, val: f64) {
        self.potential[v].store(val.to_bits(), Ordering::Release);
    }

    /// Atomically lower the potential to `val`.
    /// Returns true if the update succeeded, false if the current value was already smaller or equal.
    pub fn update_potential(&self, v: VertexId, val: f64) -> bool {
        let atom = &self.potential[v];
        let mut current = atom.load(Ordering::Relaxed);
        loop {
            if f64::from_bits(current) <= val {
                return false;
            }
            match atom.compare_exchange_weak(
                current,
                val.to_bits(),
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Copy of all potentials.
    pub fn potentials(&self) -> Vec<f64> {
        (0..self.len()).map(|v| self.potential(v)).collect()
    }

    /// Current state.
    pub fn state(&self, v: VertexId) -> VertexState {
        VertexState::from_u8(self.state[v].load(Ordering::Acquire))
    }

    /// Overwrite the state.
    pub fn set_state(&self, v: VertexId, state: VertexState) {
        self.state[v].store(state as u8, Ordering::Release);
    }

    /// Whether the vertex is a source.
    pub fn is_initial(&self, v: VertexId) -> bool {
        self.state(v) == VertexState::Initial
    }

    /// Whether the vertex is final (frozen or a source).
    pub fn is_frozen(&self, v: VertexId) -> bool {
        matches!(self.state(v), VertexState::Frozen | VertexState::Initial)
    }

    /// Whether the vertex is in the narrow band / an active list.
    pub fn is_active(&self, v: VertexId) -> bool {
        self.state(v) == VertexState::Active
    }

    /// Defining simplex of the current potential.
    pub fn simplex(&self, v: VertexId) -> DefiningSimplex {
        DefiningSimplex::unpack(self.simplex[v].load(Ordering::Acquire))
    }

    /// Record the defining simplex.
    pub fn set_simplex(&self, v: VertexId, simplex: DefiningSimplex) {
        self.simplex[v].store(simplex.pack(), Ordering::Release);
    }

    /// Time cost sampled at the start of the current solve.
    pub fn time_cost(&self, v: VertexId) -> f64 {
        self.time_cost[v]
    }

    /// All sampled time costs.
    pub fn time_costs(&self) -> &[f64] {
        &self.time_cost
    }

    /// Replace the sampled time cost of a vertex.
    pub fn set_time_cost(&mut self, v: VertexId, cost: f64) {
        self.time_cost[v] = cost;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn simplex_packing_at_the_id_limit() {
        let largest = MAX_VERTICES - 1;
        for simplex in [
            DefiningSimplex::None,
            DefiningSimplex::Point(0),
            DefiningSimplex::Point(largest),
            DefiningSimplex::Edge(largest, 0),
            DefiningSimplex::Edge(7, largest),
        ] {
            assert_eq!(DefiningSimplex::unpack(simplex.pack()), simplex);
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "packed simplex")]
    fn simplex_packing_rejects_the_sentinel_id() {
        DefiningSimplex::Point(MAX_VERTICES).pack();
    }

    #[test]
    fn new_vertices_are_unknown() {
        let attrs = Attributes::new(3);
        for v in 0..3 {
            assert_eq!(attrs.potential(v), UNKNOWN_POTENTIAL);
            assert_eq!(attrs.state(v), VertexState::Unknown);
            assert_eq!(attrs.simplex(v), DefiningSimplex::None);
        }
    }

    #[test]
    fn update_potential_monotonicity() {
        let attrs = Attributes::new(2);
        let v = 1;

        // Start at the sentinel, decrease
        assert!(attrs.update_potential(v, 10.0));
        assert_eq!(attrs.potential(v), 10.0);

        assert!(attrs.update_potential(v, 5.0));
        assert_eq!(attrs.potential(v), 5.0);

        // Increasing is refused
        assert!(!attrs.update_potential(v, 7.0));
        assert_eq!(attrs.potential(v), 5.0);

        // So is an equal value
        assert!(!attrs.update_potential(v, 5.0));
        assert_eq!(attrs.potential(v), 5.0);
    }

    #[test]
    fn cas_concurrent_monotonicity() {
        let attrs = Arc::new(Attributes::new(4));

        let mut handles = Vec::new();
        for i in 0..10 {
            let attrs = Arc::clone(&attrs);
            handles.push(std::thread::spawn(move || {
                for j in 0..100 {
                    let val = 1000.0 - (i * 100 + j) as f64;
                    attrs.update_potential(2, val);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        // The final value should be the minimum written: 1000 - 999 = 1.0
        assert_eq!(attrs.potential(2), 1.0);
    }

    #[test]
    fn simplex_packing() {
        let attrs = Attributes::new(1);
        for s in [
            DefiningSimplex::None,
            DefiningSimplex::Point(7),
            DefiningSimplex::Edge(3, 12),
            DefiningSimplex::Edge(0, 0),
        ] {
            attrs.set_simplex(0, s);
            assert_eq!(attrs.simplex(0), s);
        }
        assert_eq!(
            DefiningSimplex::Edge(3, 12).vertices().collect::<Vec<_>>(),
            vec![3, 12]
        );
        assert_eq!(DefiningSimplex::None.vertices().count(), 0);
    }

    #[test]
    fn frozen_includes_initial() {
        let attrs = Attributes::new(2);
        attrs.set_state(0, VertexState::Initial);
        attrs.set_state(1, VertexState::Active);
        assert!(attrs.is_frozen(0) && attrs.is_initial(0));
        assert!(!attrs.is_frozen(1) && attrs.is_active(1));
    }

    #[test]
    fn resize_and_reset() {
        let mut attrs = Attributes::new(2);
        attrs.set_potential(0, 1.5);
        attrs.set_state(0, VertexState::Frozen);
        attrs.set_time_cost(0, 3.0);
        attrs.resize(4);
        assert_eq!(attrs.len(), 4);
        assert_eq!(attrs.potential(0), 1.5);
        assert_eq!(attrs.state(3), VertexState::Unknown);
        attrs.reset();
        assert_eq!(attrs.potential(0), UNKNOWN_POTENTIAL);
        assert_eq!(attrs.time_cost(0), 3.0);
    }
}

// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use crossbeam_queue::SegQueue;

use crate::mesh::VertexId;

/// A change made to a mesh that solvers bound to it must react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshEvent {
    /// A vertex was inserted inside the triangle spanned by `parents`.
    VertexInserted {
        /// Handle of the new vertex.
        vertex: VertexId,
        /// Corners of the triangle that was split.
        parents: [VertexId; 3],
    },
    /// Connectivity changed without adding vertices (e.g. edge flips).
    TopologyChanged,
}

/// Lock-free channel carrying [`MeshEvent`]s from a mesh editor to a solver.
///
/// Handles are cheap to clone and share one queue. Editors `push`; the solver
/// drains the queue at the start of its next solve.
#[derive(Debug, Clone, Default)]
pub struct MeshEventQueue {
    queue: Arc<SegQueue<MeshEvent>>,
}

impl MeshEventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event.
    pub fn push(&self, event: MeshEvent) {
        self.queue.push(event);
    }

    /// Take every pending event in publication order.
    pub fn drain(&self) -> Vec<MeshEvent> {
        let mut events = Vec::with_capacity(self.queue.len());
        while let Some(event) = self.queue.pop() {
            events.push(event);
        }
        events
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::error::{EikonalError, Result};
use crate::mesh::VertexId;

/// Progress information passed to the optional callback.
#[derive(Debug, Clone, Copy)]
pub struct ProgressInfo {
    /// Number of relaxation passes completed so far.
    pub passes: u64,
    /// Total number of vertices waiting in the active lists.
    pub active_list_size: usize,
    /// Elapsed time since the solve started.
    pub elapsed: Duration,
}

/// Callback type accepted by [`crate::EikonalSolver::with_progress`].
pub type ProgressCallback = Box<dyn Fn(ProgressInfo) + Send + Sync>;

const FREE: u8 = 0;
const CLAIMED: u8 = 1;
const CLAIMED_DIRTY: u8 = 2;

/// Per-vertex claim flags for the lock-free active lists.
///
/// A vertex is claimed while it sits in exactly one worker's list. Workers
/// that cannot claim a vertex because another list owns it mark it dirty
/// instead, and the owner must process it again before releasing it.
pub struct ClaimFlags {
    flags: Box<[AtomicU8]>,
}

impl ClaimFlags {
    /// Flags for `n` vertices, all free.
    pub fn new(n: usize) -> Self {
        let flags: Box<[AtomicU8]> = (0..n)
            .map(|_| AtomicU8::new(FREE))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        ClaimFlags { flags }
    }

    /// Number of vertices covered.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether no vertices are covered.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Claim a free vertex. Returns true if this caller now owns it.
    pub fn try_claim(&self, v: VertexId) -> bool {
        self.flags[v]
            .compare_exchange(FREE, CLAIMED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether some list currently owns the vertex.
    pub fn is_claimed(&self, v: VertexId) -> bool {
        self.flags[v].load(Ordering::Acquire) != FREE
    }

    /// Ask the owner of a claimed vertex to process it again.
    ///
    /// Returns false if the vertex was free, in which case the caller should
    /// try to claim it instead.
    pub fn mark_dirty(&self, v: VertexId) -> bool {
        let mut current = self.flags[v].load(Ordering::Acquire);
        loop {
            match current {
                FREE => return false,
                CLAIMED_DIRTY => return true,
                _ => {}
            }
            match self.flags[v].compare_exchange_weak(
                current,
                CLAIMED_DIRTY,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Release an owned vertex.
    ///
    /// Fails if the vertex was marked dirty; the dirty mark is cleared and the
    /// caller keeps ownership.
    pub fn try_release(&self, v: VertexId) -> bool {
        match self.flags[v].compare_exchange(CLAIMED, FREE, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => true,
            Err(_) => {
                self.flags[v].store(CLAIMED, Ordering::Release);
                false
            }
        }
    }

    /// Release every vertex.
    pub fn clear(&self) {
        for flag in self.flags.iter() {
            flag.store(FREE, Ordering::Relaxed);
        }
    }
}

/// What a worker reports after relaxing its list for one pass.
#[derive(Debug, Default)]
pub struct ListOutcome {
    /// Vertices for the next pass.
    pub next: Vec<VertexId>,
    /// Whether any vertex was actually processed (not deferred).
    pub progressed: bool,
}

/// Distribute seeds round-robin over `workers` lists.
pub fn partition(seeds: Vec<VertexId>, workers: usize) -> Vec<Vec<VertexId>> {
    let workers = workers.max(1);
    let mut lists = vec![Vec::with_capacity(seeds.len() / workers + 1); workers];
    for (i, v) in seeds.into_iter().enumerate() {
        lists[i % workers].push(v);
    }
    lists
}

/// Pair lists at random and move half the size difference from the larger
/// list of each pair to the smaller one.
pub fn load_balance(lists: &mut [Vec<VertexId>], rng: &mut StdRng) {
    if lists.len() < 2 {
        return;
    }
    let mut order: Vec<usize> = (0..lists.len()).collect();
    order.shuffle(rng);
    for pair in order.chunks_exact(2) {
        let (big, small) = if lists[pair[0]].len() >= lists[pair[1]].len() {
            (pair[0], pair[1])
        } else {
            (pair[1], pair[0])
        };
        let moved = (lists[big].len() - lists[small].len()) / 2;
        if moved == 0 {
            continue;
        }
        let at = lists[big].len() - moved;
        let tail = lists[big].split_off(at);
        lists[small].extend(tail);
    }
}

/// Settings for one iterative solve.
pub struct PassConfig<'a> {
    /// Worker count; 1 runs every pass on the calling thread.
    pub threads: usize,
    /// Abort after this many passes.
    pub max_passes: u64,
    /// Seed for the load-balancing pairing.
    pub seed: u64,
    /// Called once per pass.
    pub progress: Option<&'a (dyn Fn(ProgressInfo) + Send + Sync)>,
}

/// Run active-list passes until every list is empty.
///
/// Each pass is three fork/join phases: the seed lists are partitioned once,
/// then every pass load-balances the lists and relaxes them in parallel. The
/// `force` argument handed to `relax` is true when the previous pass made no
/// progress, so deferring workers must process everything. Returns the number
/// of passes.
pub fn run_passes<F>(config: &PassConfig<'_>, seeds: Vec<VertexId>, relax: F) -> Result<u64>
where
    F: Fn(Vec<VertexId>, bool) -> ListOutcome + Sync,
{
    let pool = if config.threads > 1 {
        Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .build()
                .map_err(|e| EikonalError::Other(e.to_string()))?,
        )
    } else {
        None
    };

    let start_time = Instant::now();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut lists = partition(seeds, config.threads);
    let mut force = false;
    let mut passes = 0u64;

    while lists.iter().any(|list| !list.is_empty()) {
        if passes >= config.max_passes {
            tracing::warn!(limit = config.max_passes, "relaxation pass limit reached");
            return Err(EikonalError::MaxPassesExceeded {
                limit: config.max_passes,
            });
        }
        passes += 1;

        load_balance(&mut lists, &mut rng);
        let outcomes: Vec<ListOutcome> = match &pool {
            Some(pool) => pool.install(|| {
                lists
                    .into_par_iter()
                    .map(|list| relax(list, force))
                    .collect()
            }),
            None => lists.into_iter().map(|list| relax(list, force)).collect(),
        };

        force = !outcomes.iter().any(|o| o.progressed);
        lists = outcomes.into_iter().map(|o| o.next).collect();

        if let Some(cb) = config.progress {
            cb(ProgressInfo {
                passes,
                active_list_size: lists.iter().map(Vec::len).sum(),
                elapsed: start_time.elapsed(),
            });
        }
    }

    Ok(passes)
}

/// Worker count to use when none was configured.
pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

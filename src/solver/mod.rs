// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! Mesh Eikonal solver: one front end, six algorithm variants.
//!
//! All variants share the per-vertex [`Attributes`], the cached
//! [`EdgeGeometry`] and the local update in [`Relaxation::recompute`]; they
//! differ in the order in which vertices are relaxed and in how much of a
//! previous solve they reuse.

mod dfmm;
mod fim;
mod fmm;
mod ifim;

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::core::{Attributes, DefiningSimplex, VertexState, UNKNOWN_POTENTIAL};
use crate::cost::TimeCostFunction;
use crate::error::{EikonalError, Result};
use crate::events::{MeshEvent, MeshEventQueue};
use crate::field::{locate_and_interpolate, PotentialField};
use crate::geometry::{EdgeGeometry, DEFAULT_SUPPORT_DEPTH};
use crate::mesh::{Neighbors, Point, TriangleMesh, VertexId};
use crate::scheduler::{default_threads, ClaimFlags, PassConfig, ProgressCallback};
use crate::update_kernels::{local_update, Corner, Support, UpdateMethod};

/// Default convergence tolerance of the iterative variants.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Default threshold below which a time-cost change is ignored by the
/// incremental variants.
pub const DEFAULT_COST_EPSILON: f64 = 1e-12;

/// Solving strategy, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Fast Marching: heap-ordered, serial.
    Fmm,
    /// Fast Iterative Method on a single active list.
    Fim,
    /// Lock-free Fast Iterative Method over per-worker active lists.
    ParallelFim,
    /// Informed FIM: incremental re-solve after cost changes.
    Ifim,
    /// Informed FIM on the lock-free scheduler.
    ParallelIfim,
    /// Differential Fast Marching: reuses the previous visiting order.
    Dfmm,
}

impl Algorithm {
    /// Every variant, in declaration order.
    pub const ALL: [Algorithm; 6] = [
        Algorithm::Fmm,
        Algorithm::Fim,
        Algorithm::ParallelFim,
        Algorithm::Ifim,
        Algorithm::ParallelIfim,
        Algorithm::Dfmm,
    ];

    /// Whether the variant runs its passes on a worker pool.
    pub fn is_parallel(self) -> bool {
        matches!(self, Algorithm::ParallelFim | Algorithm::ParallelIfim)
    }

    /// Whether the variant reuses the previous solve after a cost change.
    pub fn is_incremental(self) -> bool {
        matches!(
            self,
            Algorithm::Ifim | Algorithm::ParallelIfim | Algorithm::Dfmm
        )
    }

    /// Whether the variant freezes vertices in heap order.
    pub fn marches(self) -> bool {
        matches!(self, Algorithm::Fmm | Algorithm::Dfmm)
    }

    /// Short name, as accepted by `FromStr`.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Fmm => "fmm",
            Algorithm::Fim => "fim",
            Algorithm::ParallelFim => "parallel-fim",
            Algorithm::Ifim => "ifim",
            Algorithm::ParallelIfim => "parallel-ifim",
            Algorithm::Dfmm => "dfmm",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = EikonalError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase().replace('_', "-");
        Algorithm::ALL
            .iter()
            .copied()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| {
                EikonalError::Other(format!(
                    "unknown algorithm '{}' (expected one of fmm, fim, parallel-fim, ifim, parallel-ifim, dfmm)",
                    s
                ))
            })
    }
}

/// Counters describing the most recent solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    /// Solves run since construction.
    pub solves: u64,
    /// Relaxation passes of the last solve (0 for the marching variants).
    pub passes: u64,
    /// Local recomputations of the last solve.
    pub recomputations: u64,
    /// Vertices whose previous value was kept by the last incremental solve.
    pub reused: usize,
    /// Vertices invalidated by the last incremental solve.
    pub invalidated: usize,
    /// Vertices left at [`UNKNOWN_POTENTIAL`].
    pub unreachable: usize,
    /// Whether the last solve reused the previous one.
    pub incremental: bool,
}

/// Result of the previous solve, kept by the incremental variants.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    pub(crate) order: Vec<VertexId>,
    pub(crate) potential: Vec<f64>,
    pub(crate) time_cost: Vec<f64>,
    pub(crate) simplex: Vec<DefiningSimplex>,
}

/// Which neighbour values the local update may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Feasibility {
    /// Only final values (frozen or initial): the marching variants.
    Frozen,
    /// Any value that is not unknown: the iterative variants.
    Known,
}

/// Borrowed view of one solver's state used by every variant's inner loop.
pub(crate) struct Relaxation<'a> {
    mesh: &'a TriangleMesh,
    geometry: &'a EdgeGeometry,
    pub(crate) attributes: &'a Attributes,
    pub(crate) claims: &'a ClaimFlags,
    method: UpdateMethod,
    feasibility: Feasibility,
    pub(crate) tolerance: f64,
    pub(crate) concurrent: bool,
    recomputations: AtomicU64,
}

impl<'a> Relaxation<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        mesh: &'a TriangleMesh,
        geometry: &'a EdgeGeometry,
        attributes: &'a Attributes,
        claims: &'a ClaimFlags,
        method: UpdateMethod,
        feasibility: Feasibility,
        tolerance: f64,
        concurrent: bool,
    ) -> Self {
        Relaxation {
            mesh,
            geometry,
            attributes,
            claims,
            method,
            feasibility,
            tolerance,
            concurrent,
            recomputations: AtomicU64::new(0),
        }
    }

    fn is_feasible(&self, v: VertexId) -> bool {
        let usable = match self.feasibility {
            Feasibility::Frozen => self.attributes.is_frozen(v),
            Feasibility::Known => self.attributes.state(v) != VertexState::Unknown,
        };
        usable && self.attributes.potential(v) < UNKNOWN_POTENTIAL
    }

    fn corner(&self, v: VertexId) -> Corner {
        Corner {
            position: self.mesh.position(v),
            potential: self.attributes.potential(v),
            feasible: self.is_feasible(v),
        }
    }

    /// Best value for `v` over its incident triangles, and the simplex that
    /// produced it. Obtuse triangles are replaced by their virtual support.
    ///
    /// Initial vertices are never recomputed: their stored value comes back.
    pub(crate) fn recompute(&self, v: VertexId) -> (f64, DefiningSimplex) {
        let attrs = self.attributes;
        if attrs.is_initial(v) {
            return (attrs.potential(v), DefiningSimplex::None);
        }
        self.recomputations.fetch_add(1, Ordering::Relaxed);

        let apex = self.mesh.position(v);
        let cost = attrs.time_cost(v);
        let mut best = (UNKNOWN_POTENTIAL, DefiningSimplex::None);
        let mut consider = |a: VertexId, b: VertexId, cos_phi: f64| {
            let (ca, cb) = (self.corner(a), self.corner(b));
            let (value, support) = local_update(self.method, &apex, ca, cb, cos_phi, cost);
            if value < best.0 {
                let simplex = match support {
                    Support::Both => DefiningSimplex::Edge(a, b),
                    Support::First => DefiningSimplex::Point(a),
                    Support::Second => DefiningSimplex::Point(b),
                    Support::Neither => return,
                };
                best = (value, simplex);
            }
        };

        for e in self.mesh.outgoing(v) {
            let h = self.mesh.next(e);
            match self.geometry.virtual_support(h) {
                Some(pairs) => {
                    for pair in pairs {
                        consider(pair.a, pair.b, pair.cos_phi);
                    }
                }
                None => consider(
                    self.mesh.origin(h),
                    self.mesh.target(h),
                    self.geometry.cos_phi(h),
                ),
            }
        }

        if best.0 >= UNKNOWN_POTENTIAL {
            tracing::trace!(vertex = v, "no feasible neighbour");
        }
        best
    }

    /// Vertices whose update reads `v`: its mesh neighbours plus the apexes
    /// that borrow it as virtual support.
    pub(crate) fn neighbors(&self, v: VertexId) -> Neighbors {
        let mut out = self.mesh.adjacent_vertices(v);
        for &d in self.geometry.support_dependents(v) {
            if !out.contains(&d) {
                out.push(d);
            }
        }
        out
    }

    /// Vertices whose values the update of `v` reads.
    pub(crate) fn update_partners(&self, v: VertexId) -> Neighbors {
        let mut out = self.mesh.adjacent_vertices(v);
        for e in self.mesh.outgoing(v) {
            if let Some([first, _]) = self.geometry.virtual_support(self.mesh.next(e)) {
                if !out.contains(&first.b) {
                    out.push(first.b);
                }
            }
        }
        out
    }

    pub(crate) fn recomputations(&self) -> u64 {
        self.recomputations.load(Ordering::Relaxed)
    }
}

struct SolveOutcome {
    order: Vec<VertexId>,
    passes: u64,
    recomputations: u64,
    reused: usize,
    invalidated: usize,
    incremental: bool,
}

/// Eikonal solver over a triangle mesh.
///
/// Potentials are travel times from the initial vertices under the time cost
/// (inverse speed) of `C`. The solver keeps its per-vertex state between
/// calls so that [`EikonalSolver::update`] can re-solve incrementally with
/// the IFIM and DFMM variants.
///
/// A solver is driven through `&mut self` and must not be shared between
/// threads while solving; [`EikonalSolver::potential_field`] hands out a
/// snapshot that can.
pub struct EikonalSolver<C: TimeCostFunction> {
    mesh: Arc<TriangleMesh>,
    cost: C,
    algorithm: Algorithm,
    method: UpdateMethod,
    attributes: Attributes,
    geometry: EdgeGeometry,
    claims: ClaimFlags,
    initial: Vec<VertexId>,
    initial_distance: Vec<f64>,
    tolerance: f64,
    cost_epsilon: f64,
    num_threads: Option<usize>,
    max_passes: Option<u64>,
    support_depth: usize,
    seed: u64,
    progress_callback: Option<ProgressCallback>,
    events: MeshEventQueue,
    mesh_replaced: bool,
    solved: bool,
    needs_full_resolve: bool,
    previous: Option<Snapshot>,
    stats: SolverStats,
    hint: AtomicUsize,
}

impl<C: TimeCostFunction> EikonalSolver<C> {
    /// Create a solver whose initial vertices sit at distance zero.
    ///
    /// # Errors
    /// Returns an error if `targets` is empty or names a vertex that is not
    /// part of any face of `mesh`.
    pub fn new(
        mesh: Arc<TriangleMesh>,
        cost: C,
        algorithm: Algorithm,
        targets: &[VertexId],
    ) -> Result<Self> {
        let n = mesh.vertex_count();
        let geometry = EdgeGeometry::build(&mesh, DEFAULT_SUPPORT_DEPTH);
        let mut solver = EikonalSolver {
            attributes: Attributes::new(n),
            claims: ClaimFlags::new(n),
            geometry,
            mesh,
            cost,
            algorithm,
            method: UpdateMethod::default(),
            initial: Vec::new(),
            initial_distance: Vec::new(),
            tolerance: DEFAULT_TOLERANCE,
            cost_epsilon: DEFAULT_COST_EPSILON,
            num_threads: None,
            max_passes: None,
            support_depth: DEFAULT_SUPPORT_DEPTH,
            seed: 0,
            progress_callback: None,
            events: MeshEventQueue::new(),
            mesh_replaced: false,
            solved: false,
            needs_full_resolve: true,
            previous: None,
            stats: SolverStats::default(),
            hint: AtomicUsize::new(0),
        };
        solver.set_initial_vertices(targets, |_| 0.0)?;
        Ok(solver)
    }

    /// Create a solver whose sources are arbitrary points inside the mesh.
    ///
    /// The corners of the face containing each point become initial
    /// vertices, at their Euclidean distance from the point.
    ///
    /// # Errors
    /// Returns an error if `points` is empty or any point lies outside the
    /// mesh.
    pub fn with_target_points(
        mesh: Arc<TriangleMesh>,
        cost: C,
        algorithm: Algorithm,
        points: &[Point],
    ) -> Result<Self> {
        if points.is_empty() {
            return Err(EikonalError::InvalidInitialVertices(
                "no target points given".into(),
            ));
        }
        let mut corners: Vec<VertexId> = Vec::new();
        let mut hint = None;
        for p in points {
            let f = mesh.locate_face(p, hint).ok_or_else(|| {
                EikonalError::InvalidInitialVertices(format!(
                    "target point ({}, {}) lies outside the mesh",
                    p.x, p.y
                ))
            })?;
            hint = Some(f);
            for v in mesh.face_vertices(f) {
                if !corners.contains(&v) {
                    corners.push(v);
                }
            }
        }

        let targets = points.to_vec();
        let mut solver = Self::new(mesh, cost, algorithm, &corners)?;
        solver.set_initial_vertices(&corners, move |q| {
            targets
                .iter()
                .map(|p| (q - p).norm())
                .fold(f64::INFINITY, f64::min)
        })?;
        Ok(solver)
    }

    /// Set the convergence tolerance of the iterative variants (builder
    /// method). Default is [`DEFAULT_TOLERANCE`].
    ///
    /// # Errors
    /// Returns an error if the tolerance is negative or not finite.
    pub fn with_tolerance(mut self, tolerance: f64) -> Result<Self> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(EikonalError::InvalidTolerance(tolerance));
        }
        self.tolerance = tolerance;
        Ok(self)
    }

    /// Select the two-point local update (builder method). Default is
    /// [`UpdateMethod::Sethian`].
    pub fn with_update_method(mut self, method: UpdateMethod) -> Self {
        self.method = method;
        self.mark_stale();
        self
    }

    /// Set the worker count of the parallel variants (builder method).
    /// If not specified, defaults to the number of available CPU cores.
    ///
    /// # Errors
    /// Returns an error if `threads` is zero.
    pub fn with_threads(mut self, threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(EikonalError::InvalidThreadCount(threads));
        }
        self.num_threads = Some(threads);
        Ok(self)
    }

    /// Set the maximum number of relaxation passes before aborting (builder
    /// method). Default is 100 times the number of vertices.
    pub fn with_max_passes(mut self, max_passes: u64) -> Self {
        self.max_passes = Some(max_passes);
        self
    }

    /// Set a callback invoked once per relaxation pass (builder method).
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Bound the number of triangles crossed when searching virtual support
    /// for obtuse angles (builder method).
    pub fn with_virtual_support_depth(mut self, depth: usize) -> Self {
        if depth != self.support_depth {
            self.support_depth = depth;
            self.geometry = EdgeGeometry::build(&self.mesh, depth);
            self.mark_stale();
        }
        self
    }

    /// Set the smallest time-cost change the incremental variants react to
    /// (builder method).
    ///
    /// # Errors
    /// Returns an error if `epsilon` is negative or not finite.
    pub fn with_cost_epsilon(mut self, epsilon: f64) -> Result<Self> {
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(EikonalError::InvalidTolerance(epsilon));
        }
        self.cost_epsilon = epsilon;
        Ok(self)
    }

    /// Seed the load-balancing pairing of the parallel variants (builder
    /// method).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Replace the initial vertices. Each gets potential
    /// `max(0, distance(position))`.
    ///
    /// # Errors
    /// Returns an error if `vertices` is empty or names a vertex that is not
    /// part of any face.
    pub fn set_initial_vertices<F>(&mut self, vertices: &[VertexId], distance: F) -> Result<()>
    where
        F: Fn(Point) -> f64,
    {
        if vertices.is_empty() {
            return Err(EikonalError::InvalidInitialVertices(
                "at least one initial vertex is required".into(),
            ));
        }
        let mut initial = Vec::with_capacity(vertices.len());
        let mut initial_distance = Vec::with_capacity(vertices.len());
        for &v in vertices {
            if v >= self.mesh.vertex_count() || self.mesh.outgoing(v).next().is_none() {
                return Err(EikonalError::InvalidInitialVertices(format!(
                    "vertex {} is not inside the mesh",
                    v
                )));
            }
            if initial.contains(&v) {
                continue;
            }
            let d = distance(self.mesh.position(v));
            initial.push(v);
            initial_distance.push(if d > 0.0 { d } else { 0.0 });
        }
        self.initial = initial;
        self.initial_distance = initial_distance;
        self.mark_stale();
        Ok(())
    }

    fn mark_stale(&mut self) {
        self.solved = false;
        self.needs_full_resolve = true;
    }

    /// Forget the current solution. The next solve starts from scratch.
    pub fn unsolve(&mut self) {
        self.attributes.reset();
        self.claims.clear();
        self.previous = None;
        self.mark_stale();
    }

    /// Solve from scratch, discarding any previous solution.
    pub fn initialize(&mut self) -> Result<()> {
        self.unsolve();
        self.solve()
    }

    /// Solve if anything changed since the last solve.
    ///
    /// Pending mesh events are applied first. The incremental variants reuse
    /// the previous solution unless the mesh, the initial vertices or the
    /// configuration changed.
    pub fn solve(&mut self) -> Result<()> {
        self.apply_mesh_events()?;
        if self.solved {
            return Ok(());
        }

        let start = Instant::now();
        self.sample_costs()?;
        let incremental =
            self.algorithm.is_incremental() && !self.needs_full_resolve && self.previous.is_some();
        let result = if incremental {
            self.solve_incremental()
        } else {
            self.solve_full()
        };
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.claims.clear();
                self.previous = None;
                self.needs_full_resolve = true;
                return Err(e);
            }
        };

        let n = self.attributes.len();
        let unreachable = (0..n)
            .filter(|&v| self.attributes.potential(v) >= UNKNOWN_POTENTIAL)
            .count();
        if unreachable > 0 {
            tracing::debug!(unreachable, "vertices left at unknown potential");
        }

        self.stats = SolverStats {
            solves: self.stats.solves + 1,
            passes: outcome.passes,
            recomputations: outcome.recomputations,
            reused: outcome.reused,
            invalidated: outcome.invalidated,
            unreachable,
            incremental: outcome.incremental,
        };
        if self.algorithm.is_incremental() {
            self.previous = Some(Snapshot {
                order: outcome.order,
                potential: self.attributes.potentials(),
                time_cost: self.attributes.time_costs().to_vec(),
                simplex: (0..n).map(|v| self.attributes.simplex(v)).collect(),
            });
        }
        self.solved = true;
        self.needs_full_resolve = false;

        tracing::info!(
            algorithm = %self.algorithm,
            vertices = n,
            passes = outcome.passes,
            recomputations = outcome.recomputations,
            incremental = outcome.incremental,
            elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
            "solve finished"
        );
        Ok(())
    }

    /// Let the cost function absorb pending changes and re-solve if it had
    /// any.
    pub fn update(&mut self) -> Result<()> {
        if self.cost.needs_update() {
            self.cost.update();
            self.solved = false;
        }
        self.solve()
    }

    fn worker_count(&self) -> usize {
        if self.algorithm.is_parallel() {
            self.num_threads.unwrap_or_else(default_threads)
        } else {
            1
        }
    }

    fn pass_config(&self) -> PassConfig<'_> {
        let n = self.attributes.len() as u64;
        PassConfig {
            threads: self.worker_count(),
            max_passes: self.max_passes.unwrap_or(100 * n + 100),
            seed: self.seed,
            progress: self.progress_callback.as_deref(),
        }
    }

    fn relaxation(&self) -> Relaxation<'_> {
        let feasibility = if self.algorithm.marches() {
            Feasibility::Frozen
        } else {
            Feasibility::Known
        };
        Relaxation::new(
            &self.mesh,
            &self.geometry,
            &self.attributes,
            &self.claims,
            self.method,
            feasibility,
            self.tolerance,
            self.worker_count() > 1,
        )
    }

    fn sample_costs(&mut self) -> Result<()> {
        let n = self.mesh.vertex_count();
        let mut costs = Vec::with_capacity(n);
        for v in 0..n {
            let value = self.cost.cost_at(v, self.mesh.position(v));
            if !value.is_finite() || value <= 0.0 {
                return Err(EikonalError::InvalidCost { vertex: v, value });
            }
            costs.push(value);
        }
        for (v, cost) in costs.into_iter().enumerate() {
            self.attributes.set_time_cost(v, cost);
        }
        Ok(())
    }

    fn seed_initial(&mut self) {
        self.attributes.reset();
        self.claims.clear();
        for (&v, &d) in self.initial.iter().zip(&self.initial_distance) {
            self.attributes.set_potential(v, d);
            self.attributes.set_state(v, VertexState::Initial);
        }
    }

    fn solve_full(&mut self) -> Result<SolveOutcome> {
        self.seed_initial();
        let config = self.pass_config();
        let relax = self.relaxation();
        let mut order = Vec::new();
        let passes = match self.algorithm {
            Algorithm::Fmm | Algorithm::Dfmm => {
                order = fmm::solve(&relax, &self.initial);
                0
            }
            Algorithm::Fim | Algorithm::ParallelFim | Algorithm::Ifim | Algorithm::ParallelIfim => {
                fim::solve(&relax, &self.initial, &config, &fim::Plain)?
            }
        };
        Ok(SolveOutcome {
            order,
            passes,
            recomputations: relax.recomputations(),
            reused: 0,
            invalidated: self.attributes.len(),
            incremental: false,
        })
    }

    fn solve_incremental(&mut self) -> Result<SolveOutcome> {
        let previous = match self.previous.take() {
            Some(previous) => previous,
            None => return self.solve_full(),
        };
        let config = self.pass_config();
        let relax = self.relaxation();
        let outcome = if self.algorithm.marches() {
            let redo = dfmm::resolve(&relax, &previous, self.cost_epsilon);
            tracing::debug!(
                reused = redo.reused,
                invalidated = redo.invalidated,
                "dfmm reused order prefix"
            );
            SolveOutcome {
                order: redo.order,
                passes: 0,
                recomputations: relax.recomputations(),
                reused: redo.reused,
                invalidated: redo.invalidated,
                incremental: true,
            }
        } else {
            let redo = ifim::resolve(&relax, &previous, &config, self.cost_epsilon)?;
            SolveOutcome {
                order: Vec::new(),
                passes: redo.passes,
                recomputations: relax.recomputations(),
                reused: redo.reused,
                invalidated: redo.invalidated,
                incremental: true,
            }
        };
        Ok(outcome)
    }

    fn apply_mesh_events(&mut self) -> Result<()> {
        if self.events.is_empty() && !self.mesh_replaced {
            return Ok(());
        }
        let events = self.events.drain();
        let mut expected = self.attributes.len();
        for event in &events {
            if let MeshEvent::VertexInserted { vertex, .. } = event {
                expected = expected.max(vertex + 1);
            }
        }
        let got = self.mesh.vertex_count();
        if expected != got {
            for event in events {
                self.events.push(event);
            }
            return Err(EikonalError::InconsistentMesh { expected, got });
        }

        tracing::debug!(
            events = events.len(),
            vertices = got,
            "adopting edited mesh"
        );
        self.attributes.resize(got);
        self.claims = ClaimFlags::new(got);
        self.geometry = EdgeGeometry::build(&self.mesh, self.support_depth);
        self.mesh_replaced = false;
        self.unsolve();
        Ok(())
    }

    /// Adopt an edited mesh. The events describing the edit must be pushed
    /// to [`EikonalSolver::event_queue`]; they are applied on the next solve.
    pub fn set_mesh(&mut self, mesh: Arc<TriangleMesh>) {
        self.mesh = mesh;
        self.mesh_replaced = true;
        self.solved = false;
    }

    /// Channel on which mesh edits are announced to this solver.
    pub fn event_queue(&self) -> MeshEventQueue {
        self.events.clone()
    }

    fn stored(&self, v: VertexId) -> f64 {
        if v < self.attributes.len() {
            self.attributes.potential(v)
        } else {
            UNKNOWN_POTENTIAL
        }
    }

    /// Stored potential of a vertex, [`UNKNOWN_POTENTIAL`] if unreached.
    pub fn potential(&self, v: VertexId) -> f64 {
        self.stored(v)
    }

    /// Potential interpolated at `(x, y)`, [`UNKNOWN_POTENTIAL`] outside the
    /// mesh or where a corner is unreached.
    pub fn potential_at(&self, x: f64, y: f64) -> f64 {
        locate_and_interpolate(&self.mesh, &self.hint, &Point::new(x, y), |v| {
            self.stored(v)
        })
    }

    /// Snapshot of the current potentials that can be queried from any
    /// thread.
    pub fn potential_field(&self) -> PotentialField {
        let n = self.mesh.vertex_count();
        PotentialField::new(
            Arc::clone(&self.mesh),
            (0..n).map(|v| self.stored(v)).collect(),
        )
    }

    /// The mesh the solver works on.
    pub fn discretization(&self) -> Arc<TriangleMesh> {
        Arc::clone(&self.mesh)
    }

    /// Whether the stored potentials reflect the current mesh and costs.
    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// Counters of the last solve.
    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    /// The solving strategy.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The cost function.
    pub fn cost(&self) -> &C {
        &self.cost
    }

    /// Mutable access to the cost function. The next solve resamples it.
    pub fn cost_mut(&mut self) -> &mut C {
        self.solved = false;
        &mut self.cost
    }

    /// State of a vertex.
    pub fn state(&self, v: VertexId) -> VertexState {
        if v < self.attributes.len() {
            self.attributes.state(v)
        } else {
            VertexState::Unknown
        }
    }

    /// The neighbours that produced a vertex's potential.
    pub fn defining_simplex(&self, v: VertexId) -> DefiningSimplex {
        if v < self.attributes.len() {
            self.attributes.simplex(v)
        } else {
            DefiningSimplex::None
        }
    }

    /// The initial vertices.
    pub fn initial_vertices(&self) -> &[VertexId] {
        &self.initial
    }

    /// Whether following defining simplices from some vertex leads back to
    /// it. A consistent solution has no such cycle.
    pub fn has_dependency_cycle(&self) -> bool {
        ifim::has_cycle(&self.attributes)
    }
}

// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! Eikonal solvers on planar triangle meshes.
//!
//! This library computes travel times `T` on the vertices of a triangulation
//! by solving the eikonal equation |∇T| = c, where `c` is a time cost
//! (inverse speed) sampled at the vertices. Six strategies share one update
//! rule: Fast Marching, the Fast Iterative Method (serial and lock-free
//! parallel), the Informed FIM with incremental re-solves (serial and
//! parallel), and Differential Fast Marching, which replays the previous
//! visiting order after a cost change. Obtuse triangles are handled through
//! virtual support found by unfolding neighbouring triangles.
//!
//! ```no_run
//! use std::sync::Arc;
//! use eikonal_mesh::{Algorithm, EikonalSolver, TriangleMesh, UniformCost};
//!
//! # fn main() -> eikonal_mesh::Result<()> {
//! let mesh = Arc::new(TriangleMesh::rectangle(0.0, 0.0, 1.0, 1.0, 10, 10)?);
//! let mut solver = EikonalSolver::new(mesh, UniformCost::default(), Algorithm::Fmm, &[0])?;
//! solver.solve()?;
//! let t = solver.potential_at(1.0, 1.0);
//! # let _ = t;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

/// Per-vertex solver state.
pub mod core;
/// Time cost functions.
pub mod cost;
/// Error types for the library.
pub mod error;
/// Mesh edit notifications.
pub mod events;
/// Potential interpolation and shareable snapshots.
pub mod field;
/// Cached angles and virtual support per half-edge.
pub mod geometry;
/// File I/O for per-vertex costs and potentials.
pub mod io;
/// Half-edge triangle mesh.
pub mod mesh;
/// Claim flags and pass scheduling for the iterative solvers.
pub mod scheduler;
/// The solver front end and its algorithm variants.
pub mod solver;
/// Local update rules on a single triangle.
pub mod update_kernels;

pub use crate::core::{DefiningSimplex, VertexState, UNKNOWN_POTENTIAL};
pub use crate::cost::{PositionCost, TimeCostFunction, UniformCost, VertexCost};
pub use crate::error::{EikonalError, Result};
pub use crate::events::{MeshEvent, MeshEventQueue};
pub use crate::field::PotentialField;
pub use crate::mesh::{Point, TriangleMesh, VertexId};
pub use crate::scheduler::{ProgressCallback, ProgressInfo};
pub use crate::solver::{Algorithm, EikonalSolver, SolverStats};
pub use crate::update_kernels::UpdateMethod;

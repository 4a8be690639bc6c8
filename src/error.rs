// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;

/// Errors that can occur during mesh construction, solver setup, I/O, or execution.
#[derive(Debug)]
pub enum EikonalError {
    /// Too few points or triangles to form a mesh.
    EmptyMesh,
    /// A triangle references a point index that does not exist.
    IndexOutOfRange {
        /// The triangle index.
        triangle: usize,
        /// The offending point index.
        index: usize,
        /// The number of points available.
        num_points: usize,
    },
    /// A triangle has (near) zero area or repeats a corner.
    DegenerateTriangle {
        /// The triangle index.
        triangle: usize,
    },
    /// A directed edge is used by more than one triangle.
    NonManifoldEdge {
        /// Edge origin.
        from: usize,
        /// Edge target.
        to: usize,
    },
    /// Several separate triangle fans meet at a vertex (a bowtie).
    NonManifoldVertex(usize),
    /// More vertices than a vertex id can address.
    TooManyVertices {
        /// Number of vertices requested.
        count: usize,
        /// Largest supported count.
        limit: usize,
    },
    /// A face handle does not belong to the mesh.
    InvalidFace(usize),
    /// A point does not lie strictly inside the face it should split.
    PointOutsideFace {
        /// The face index.
        face: usize,
        /// The point coordinates.
        point: [f64; 2],
    },
    /// An initial (target) vertex set is invalid.
    InvalidInitialVertices(String),
    /// Solver tolerance is negative or not finite.
    InvalidTolerance(f64),
    /// Worker thread count is zero.
    InvalidThreadCount(usize),
    /// Time cost value is not positive and finite.
    InvalidCost {
        /// The vertex index of the invalid value.
        vertex: usize,
        /// The invalid value.
        value: f64,
    },
    /// Speed value is not positive and finite.
    InvalidSpeed {
        /// The flat index of the invalid value.
        index: usize,
        /// The invalid value.
        value: f64,
    },
    /// The mesh held by a solver no longer matches its attribute arrays.
    InconsistentMesh {
        /// Vertex count the solver expected after draining mesh events.
        expected: usize,
        /// Vertex count of the mesh.
        got: usize,
    },
    /// Maximum number of relaxation passes exceeded (likely indicates non-convergence).
    MaxPassesExceeded {
        /// The limit that was set.
        limit: u64,
    },
    /// Array shape does not match expected shape.
    ShapeMismatch {
        /// The expected shape.
        expected: Vec<usize>,
        /// The actual shape encountered.
        got: Vec<usize>,
    },
    /// Unsupported data type in file.
    UnsupportedDtype(String),
    /// Unsupported file format (unrecognized extension).
    UnsupportedFileFormat(String),
    /// Expected MAT variable not found in file.
    MatVariableNotFound {
        /// The variable name that was requested.
        expected: String,
        /// The variable names that are available.
        available: Vec<String>,
    },
    /// I/O error occurred.
    IoError(std::io::Error),
    /// Other error with a descriptive message.
    Other(String),
}

impl fmt::Display for EikonalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EikonalError::EmptyMesh => {
                write!(f, "empty mesh: need at least 3 points and 1 triangle")
            }
            EikonalError::IndexOutOfRange {
                triangle,
                index,
                num_points,
            } => {
                write!(
                    f,
                    "triangle {} references point {} but only {} points exist",
                    triangle, index, num_points
                )
            }
            EikonalError::DegenerateTriangle { triangle } => {
                write!(f, "triangle {} is degenerate", triangle)
            }
            EikonalError::NonManifoldEdge { from, to } => {
                write!(f, "non-manifold edge {} -> {}", from, to)
            }
            EikonalError::NonManifoldVertex(v) => {
                write!(f, "non-manifold vertex {}: its triangles form separate fans", v)
            }
            EikonalError::TooManyVertices { count, limit } => {
                write!(f, "too many vertices: {} (at most {} supported)", count, limit)
            }
            EikonalError::InvalidFace(face) => write!(f, "invalid face handle: {}", face),
            EikonalError::PointOutsideFace { face, point } => {
                write!(
                    f,
                    "point ({}, {}) is not strictly inside face {}",
                    point[0], point[1], face
                )
            }
            EikonalError::InvalidInitialVertices(reason) => {
                write!(f, "invalid initial vertices: {}", reason)
            }
            EikonalError::InvalidTolerance(tol) => {
                write!(
                    f,
                    "invalid tolerance: {} (must be non-negative and finite)",
                    tol
                )
            }
            EikonalError::InvalidThreadCount(n) => {
                write!(f, "invalid thread count: {} (must be >= 1)", n)
            }
            EikonalError::InvalidCost { vertex, value } => {
                write!(
                    f,
                    "invalid time cost at vertex {}: {} (must be positive and finite)",
                    vertex, value
                )
            }
            EikonalError::InvalidSpeed { index, value } => {
                write!(
                    f,
                    "invalid speed at index {}: {} (must be positive and finite)",
                    index, value
                )
            }
            EikonalError::InconsistentMesh { expected, got } => {
                write!(
                    f,
                    "inconsistent mesh: solver tracks {} vertices but mesh has {}",
                    expected, got
                )
            }
            EikonalError::MaxPassesExceeded { limit } => {
                write!(f, "max relaxation passes exceeded: limit was {}", limit)
            }
            EikonalError::ShapeMismatch { expected, got } => {
                write!(f, "shape mismatch: expected {:?}, got {:?}", expected, got)
            }
            EikonalError::UnsupportedDtype(dtype) => {
                write!(f, "unsupported dtype: {}", dtype)
            }
            EikonalError::UnsupportedFileFormat(ext) => {
                write!(f, "unsupported file format: {}", ext)
            }
            EikonalError::MatVariableNotFound {
                expected,
                available,
            } => {
                write!(
                    f,
                    "MAT variable '{}' not found; available variables: {:?}",
                    expected, available
                )
            }
            EikonalError::IoError(e) => write!(f, "I/O error: {}", e),
            EikonalError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for EikonalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EikonalError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EikonalError {
    fn from(e: std::io::Error) -> Self {
        EikonalError::IoError(e)
    }
}

/// Convenience type alias for Results with EikonalError.
pub type Result<T> = std::result::Result<T, EikonalError>;

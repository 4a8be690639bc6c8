// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use nalgebra::{Point2, Vector2};
use smallvec::SmallVec;

use crate::core::MAX_VERTICES;
use crate::error::{EikonalError, Result};
use crate::events::MeshEvent;

/// A point in the plane.
pub type Point = Point2<f64>;
/// Index of a mesh vertex.
pub type VertexId = usize;
/// Index of a directed half-edge.
pub type EdgeId = usize;
/// Index of a triangular face.
pub type FaceId = usize;
/// Inline list of vertex handles returned by adjacency queries.
pub type Neighbors = SmallVec<[VertexId; 8]>;

/// Relative area below which a triangle is treated as degenerate.
const AREA_EPSILON: f64 = 1e-12;
/// Barycentric slack for point-in-triangle tests.
const LOCATE_EPSILON: f64 = 1e-12;

/// Planar triangulation stored as a half-edge structure.
///
/// Every face is a counter-clockwise triangle made of three half-edges linked
/// by `next`. Interior half-edges have a `twin` running the other way; boundary
/// half-edges have none. Each vertex keeps one outgoing half-edge, chosen on
/// the boundary when the vertex has one, so that [`TriangleMesh::outgoing`]
/// sweeps its whole fan.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    points: Vec<Point>,
    he_target: Vec<VertexId>,
    he_next: Vec<EdgeId>,
    he_twin: Vec<Option<EdgeId>>,
    he_face: Vec<FaceId>,
    vertex_edge: Vec<Option<EdgeId>>,
    face_edge: Vec<EdgeId>,
}

fn orient(a: &Point, b: &Point, c: &Point) -> f64 {
    (b - a).perp(&(c - a))
}

fn check_vertex_count(count: usize) -> Result<()> {
    if count > MAX_VERTICES {
        return Err(EikonalError::TooManyVertices {
            count,
            limit: MAX_VERTICES,
        });
    }
    Ok(())
}

impl TriangleMesh {
    /// Build a mesh from points and triangles given as point-index triples.
    ///
    /// Triangles are re-oriented counter-clockwise. Degenerate triangles,
    /// out-of-range indices, edges shared by more than two triangles and
    /// vertices where separate fans touch are rejected.
    pub fn from_triangles(points: Vec<Point>, triangles: &[[VertexId; 3]]) -> Result<Self> {
        if points.len() < 3 || triangles.is_empty() {
            return Err(EikonalError::EmptyMesh);
        }
        check_vertex_count(points.len())?;

        let num_points = points.len();
        let num_edges = 3 * triangles.len();
        let mut mesh = TriangleMesh {
            he_target: Vec::with_capacity(num_edges),
            he_next: Vec::with_capacity(num_edges),
            he_twin: vec![None; num_edges],
            he_face: Vec::with_capacity(num_edges),
            vertex_edge: vec![None; num_points],
            face_edge: Vec::with_capacity(triangles.len()),
            points,
        };

        let mut directed: HashMap<(VertexId, VertexId), EdgeId> = HashMap::with_capacity(num_edges);
        for (face, tri) in triangles.iter().enumerate() {
            for &index in tri {
                if index >= num_points {
                    return Err(EikonalError::IndexOutOfRange {
                        triangle: face,
                        index,
                        num_points,
                    });
                }
            }
            let mut t = *tri;
            if t[0] == t[1] || t[1] == t[2] || t[0] == t[2] {
                return Err(EikonalError::DegenerateTriangle { triangle: face });
            }
            let (a, b, c) = (&mesh.points[t[0]], &mesh.points[t[1]], &mesh.points[t[2]]);
            let area = orient(a, b, c);
            let scale = (b - a).norm_squared().max((c - a).norm_squared());
            if area.abs() <= AREA_EPSILON * scale {
                return Err(EikonalError::DegenerateTriangle { triangle: face });
            }
            if area < 0.0 {
                t.swap(1, 2);
            }

            let base = 3 * face;
            mesh.face_edge.push(base);
            for k in 0..3 {
                let from = t[k];
                let to = t[(k + 1) % 3];
                let e = base + k;
                if directed.insert((from, to), e).is_some() {
                    return Err(EikonalError::NonManifoldEdge { from, to });
                }
                mesh.he_target.push(to);
                mesh.he_next.push(base + (k + 1) % 3);
                mesh.he_face.push(face);
            }
        }

        for (&(from, to), &e) in &directed {
            mesh.he_twin[e] = directed.get(&(to, from)).copied();
        }

        for e in 0..num_edges {
            let origin = mesh.origin(e);
            let replace = match mesh.vertex_edge[origin] {
                None => true,
                Some(current) => mesh.he_twin[current].is_some() && mesh.he_twin[e].is_none(),
            };
            if replace {
                mesh.vertex_edge[origin] = Some(e);
            }
        }

        // A single fan walk from `vertex_edge` must reach every outgoing edge.
        let mut degree = vec![0usize; num_points];
        for e in 0..num_edges {
            degree[mesh.origin(e)] += 1;
        }
        for (v, &count) in degree.iter().enumerate() {
            if mesh.outgoing(v).count() != count {
                return Err(EikonalError::NonManifoldVertex(v));
            }
        }

        Ok(mesh)
    }

    /// Structured grid over the rectangle `[x0, x0 + width] x [y0, y0 + height]`
    /// with `nx * ny` cells, each split along its rising diagonal into two
    /// right triangles.
    ///
    /// Vertex `(i, j)` has index `j * (nx + 1) + i`.
    pub fn rectangle(x0: f64, y0: f64, width: f64, height: f64, nx: usize, ny: usize) -> Result<Self> {
        if nx == 0 || ny == 0 {
            return Err(EikonalError::EmptyMesh);
        }
        let dx = width / nx as f64;
        let dy = height / ny as f64;
        let mut points = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0..=ny {
            for i in 0..=nx {
                points.push(Point::new(x0 + i as f64 * dx, y0 + j as f64 * dy));
            }
        }
        let idx = |i: usize, j: usize| j * (nx + 1) + i;
        let mut triangles = Vec::with_capacity(2 * nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let a = idx(i, j);
                let b = idx(i + 1, j);
                let c = idx(i + 1, j + 1);
                let d = idx(i, j + 1);
                triangles.push([a, b, c]);
                triangles.push([a, c, d]);
            }
        }
        Self::from_triangles(points, &triangles)
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Number of faces.
    pub fn face_count(&self) -> usize {
        self.face_edge.len()
    }

    /// Number of half-edges.
    pub fn half_edge_count(&self) -> usize {
        self.he_target.len()
    }

    /// Vertex coordinates.
    pub fn position(&self, v: VertexId) -> Point {
        self.points[v]
    }

    /// All vertex coordinates, indexed by vertex handle.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Vertex the half-edge points to.
    pub fn target(&self, e: EdgeId) -> VertexId {
        self.he_target[e]
    }

    /// Vertex the half-edge starts from.
    pub fn origin(&self, e: EdgeId) -> VertexId {
        self.he_target[self.prev(e)]
    }

    /// Next half-edge of the same face.
    pub fn next(&self, e: EdgeId) -> EdgeId {
        self.he_next[e]
    }

    /// Previous half-edge of the same face.
    pub fn prev(&self, e: EdgeId) -> EdgeId {
        self.he_next[self.he_next[e]]
    }

    /// Oppositely directed half-edge, `None` on the boundary.
    pub fn twin(&self, e: EdgeId) -> Option<EdgeId> {
        self.he_twin[e]
    }

    /// Face the half-edge belongs to.
    pub fn face(&self, e: EdgeId) -> FaceId {
        self.he_face[e]
    }

    /// One half-edge of the face.
    pub fn face_edge(&self, f: FaceId) -> EdgeId {
        self.face_edge[f]
    }

    /// Corners of a face in counter-clockwise order.
    pub fn face_vertices(&self, f: FaceId) -> [VertexId; 3] {
        let e = self.face_edge[f];
        [self.origin(e), self.target(e), self.target(self.next(e))]
    }

    /// Outgoing half-edges of `v` in counter-clockwise order.
    pub fn outgoing(&self, v: VertexId) -> Outgoing<'_> {
        let start = self.vertex_edge.get(v).copied().flatten();
        Outgoing {
            mesh: self,
            start,
            current: start,
        }
    }

    /// Vertices sharing an edge with `v`.
    pub fn adjacent_vertices(&self, v: VertexId) -> Neighbors {
        let mut out = Neighbors::new();
        let mut last = None;
        for e in self.outgoing(v) {
            out.push(self.target(e));
            last = Some(e);
        }
        if let Some(e) = last {
            if self.twin(self.prev(e)).is_none() {
                out.push(self.target(self.next(e)));
            }
        }
        out
    }

    /// Whether `v` lies on the mesh boundary (isolated vertices count as boundary).
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        match self.vertex_edge[v] {
            Some(e) => self.twin(e).is_none(),
            None => true,
        }
    }

    /// Axis-aligned bounding box as `(min, max)`.
    pub fn bounds(&self) -> (Point, Point) {
        let mut min = self.points[0];
        let mut max = self.points[0];
        for p in &self.points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        (min, max)
    }

    /// Barycentric coordinates of `p` with respect to the corners of face `f`
    /// (in [`TriangleMesh::face_vertices`] order).
    pub fn barycentric(&self, f: FaceId, p: &Point) -> [f64; 3] {
        let [a, b, c] = self.face_vertices(f).map(|v| self.points[v]);
        let area = orient(&a, &b, &c);
        let wa = orient(p, &b, &c) / area;
        let wb = orient(&a, p, &c) / area;
        [wa, wb, 1.0 - wa - wb]
    }

    /// Whether `p` lies in the closed face `f`.
    pub fn contains(&self, f: FaceId, p: &Point) -> bool {
        self.barycentric(f, p).iter().all(|&w| w >= -LOCATE_EPSILON)
    }

    /// Find a face containing `p`.
    ///
    /// Walks across edges from `hint` towards the point; if the walk leaves the
    /// mesh or stalls, every face is scanned. Returns `None` outside the mesh.
    pub fn locate_face(&self, p: &Point, hint: Option<FaceId>) -> Option<FaceId> {
        if self.face_edge.is_empty() || !p.x.is_finite() || !p.y.is_finite() {
            return None;
        }
        let mut f = hint.filter(|&f| f < self.face_count()).unwrap_or(0);
        'walk: for _ in 0..self.face_count() {
            let start = self.face_edge[f];
            let mut e = start;
            loop {
                let a = self.points[self.origin(e)];
                let b = self.points[self.target(e)];
                let scale = (b - a).norm();
                if orient(&a, &b, p) < -LOCATE_EPSILON * scale {
                    match self.twin(e) {
                        Some(t) => {
                            f = self.face(t);
                            continue 'walk;
                        }
                        None => break 'walk,
                    }
                }
                e = self.next(e);
                if e == start {
                    return Some(f);
                }
            }
        }
        (0..self.face_count()).find(|&f| self.contains(f, p))
    }

    /// Insert a vertex strictly inside face `f`, splitting it into three.
    ///
    /// The original face keeps its handle; two faces and six half-edges are
    /// appended.
    pub fn split_face(&mut self, f: FaceId, p: Point) -> Result<MeshEvent> {
        if f >= self.face_count() {
            return Err(EikonalError::InvalidFace(f));
        }
        check_vertex_count(self.points.len() + 1)?;
        if self.barycentric(f, &p).iter().any(|&w| w <= LOCATE_EPSILON) {
            return Err(EikonalError::PointOutsideFace {
                face: f,
                point: [p.x, p.y],
            });
        }

        let ea = self.face_edge[f];
        let eb = self.next(ea);
        let ec = self.next(eb);
        let parents = [self.origin(ea), self.origin(eb), self.origin(ec)];
        let [a, b, c] = parents;

        let v = self.points.len();
        self.points.push(p);
        let f1 = self.face_count();
        let f2 = f1 + 1;
        let h = self.half_edge_count();
        // h + 0: b -> v, h + 1: v -> a   (face f)
        // h + 2: c -> v, h + 3: v -> b   (face f1)
        // h + 4: a -> v, h + 5: v -> c   (face f2)
        self.he_target.extend_from_slice(&[v, a, v, b, v, c]);
        self.he_next
            .extend_from_slice(&[h + 1, ea, h + 3, eb, h + 5, ec]);
        self.he_twin.extend_from_slice(&[
            Some(h + 3),
            Some(h + 4),
            Some(h + 5),
            Some(h),
            Some(h + 1),
            Some(h + 2),
        ]);
        self.he_face.extend_from_slice(&[f, f, f1, f1, f2, f2]);

        self.he_next[ea] = h;
        self.he_next[eb] = h + 2;
        self.he_next[ec] = h + 4;
        self.he_face[eb] = f1;
        self.he_face[ec] = f2;
        self.face_edge.push(eb);
        self.face_edge.push(ec);
        self.vertex_edge.push(Some(h + 1));

        Ok(MeshEvent::VertexInserted { vertex: v, parents })
    }
}

/// Iterator over the outgoing half-edges of a vertex.
pub struct Outgoing<'a> {
    mesh: &'a TriangleMesh,
    start: Option<EdgeId>,
    current: Option<EdgeId>,
}

impl Iterator for Outgoing<'_> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<EdgeId> {
        let e = self.current?;
        self.current = match self.mesh.twin(self.mesh.prev(e)) {
            Some(t) if Some(t) != self.start => Some(t),
            _ => None,
        };
        Some(e)
    }
}

/// Cosine of the angle at `apex` between the directions to `a` and `b`.
pub fn cos_angle(apex: &Point, a: &Point, b: &Point) -> f64 {
    let u: Vector2<f64> = a - apex;
    let w: Vector2<f64> = b - apex;
    let denom = u.norm() * w.norm();
    if denom == 0.0 {
        return 1.0;
    }
    (u.dot(&w) / denom).clamp(-1.0, 1.0)
}

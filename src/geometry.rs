// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use nalgebra::Vector2;
use smallvec::SmallVec;

use crate::mesh::{cos_angle, EdgeId, Point, TriangleMesh, VertexId};

/// Tolerance on cosines when classifying angles as acute or obtuse.
pub const ANGLE_EPSILON: f64 = 1e-9;

/// Default bound on how many triangles the virtual-support search crosses.
pub const DEFAULT_SUPPORT_DEPTH: usize = 16;

/// One substitute update pair standing in for an obtuse triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportPair {
    /// First neighbour (counter-clockwise side).
    pub a: VertexId,
    /// Second neighbour.
    pub b: VertexId,
    /// Cosine of the angle at the apex between `a` and `b`.
    pub cos_phi: f64,
}

/// Per half-edge geometry cached for the local update.
///
/// A half-edge `h` is seen from the apex of its own face, `target(next(h))`:
/// `cos_phi(h)` is the cosine of the angle at that apex, and when the angle
/// is obtuse `virtual_support(h)` holds the two acute pairs that replace the
/// triangle.
#[derive(Debug, Clone)]
pub struct EdgeGeometry {
    cos_phi: Vec<f64>,
    virtual_support: Vec<Option<[SupportPair; 2]>>,
    support_dependents: Vec<SmallVec<[VertexId; 2]>>,
}

/// Vertex opposite to `h` in its face.
pub fn apex(mesh: &TriangleMesh, h: EdgeId) -> VertexId {
    mesh.target(mesh.next(h))
}

fn cross(u: &Vector2<f64>, w: &Vector2<f64>) -> f64 {
    u.perp(w)
}

impl EdgeGeometry {
    /// Compute angles and virtual support for every half-edge of `mesh`.
    pub fn build(mesh: &TriangleMesh, max_depth: usize) -> Self {
        let n_edges = mesh.half_edge_count();
        let mut cos_phi = Vec::with_capacity(n_edges);
        let mut virtual_support = Vec::with_capacity(n_edges);
        let mut support_dependents = vec![SmallVec::new(); mesh.vertex_count()];

        for h in 0..n_edges {
            let p = apex(mesh, h);
            let c = cos_angle(
                &mesh.position(p),
                &mesh.position(mesh.origin(h)),
                &mesh.position(mesh.target(h)),
            );
            cos_phi.push(c);

            let support = if c < -ANGLE_EPSILON {
                compute_virtual_support(mesh, h, max_depth)
            } else {
                None
            };
            if let Some([first, _]) = &support {
                let dependents: &mut SmallVec<[VertexId; 2]> = &mut support_dependents[first.b];
                if !dependents.contains(&p) {
                    dependents.push(p);
                }
            }
            virtual_support.push(support);
        }

        let obtuse = cos_phi.iter().filter(|&&c| c < -ANGLE_EPSILON).count();
        let unsupported = (0..n_edges)
            .filter(|&h| cos_phi[h] < -ANGLE_EPSILON && virtual_support[h].is_none())
            .count();
        tracing::debug!(
            half_edges = n_edges,
            obtuse,
            unsupported,
            "edge geometry built"
        );

        EdgeGeometry {
            cos_phi,
            virtual_support,
            support_dependents,
        }
    }

    /// Cosine of the angle opposite `h`.
    pub fn cos_phi(&self, h: EdgeId) -> f64 {
        self.cos_phi[h]
    }

    /// Whether the angle opposite `h` exceeds 90 degrees (beyond tolerance).
    pub fn is_non_acute(&self, h: EdgeId) -> bool {
        self.cos_phi[h] < -ANGLE_EPSILON
    }

    /// Substitute pairs for an obtuse angle, if the search found a split.
    pub fn virtual_support(&self, h: EdgeId) -> Option<&[SupportPair; 2]> {
        self.virtual_support[h].as_ref()
    }

    /// Apexes whose virtual support borrows vertex `v`.
    ///
    /// A change at `v` can improve these apexes even though they do not
    /// share an edge with it.
    pub fn support_dependents(&self, v: VertexId) -> &[VertexId] {
        self.support_dependents
            .get(v)
            .map(|d| d.as_slice())
            .unwrap_or(&[])
    }
}

/// Search for a vertex that splits the obtuse angle opposite `h` into two
/// acute angles.
///
/// Starting from the triangle across `h`, the search follows the bisector of
/// the obtuse angle from triangle to triangle. It stops at the mesh boundary
/// or after `max_depth` triangles.
pub fn compute_virtual_support(
    mesh: &TriangleMesh,
    h: EdgeId,
    max_depth: usize,
) -> Option<[SupportPair; 2]> {
    let p_id = apex(mesh, h);
    let a_id = mesh.origin(h);
    let b_id = mesh.target(h);
    let p: Point = mesh.position(p_id);
    let pa = mesh.position(a_id) - p;
    let pb = mesh.position(b_id) - p;
    let bisector = pa.normalize() + pb.normalize();

    let mut cur = mesh.twin(h)?;
    for _ in 0..max_depth {
        let c_id = apex(mesh, cur);
        let pc = mesh.position(c_id) - p;

        if cross(&pa, &pc) > 0.0 && cross(&pc, &pb) > 0.0 {
            let cos_ac = cos_angle(&p, &mesh.position(a_id), &mesh.position(c_id));
            let cos_cb = cos_angle(&p, &mesh.position(c_id), &mesh.position(b_id));
            if cos_ac > ANGLE_EPSILON && cos_cb > ANGLE_EPSILON {
                return Some([
                    SupportPair {
                        a: a_id,
                        b: c_id,
                        cos_phi: cos_ac,
                    },
                    SupportPair {
                        a: c_id,
                        b: b_id,
                        cos_phi: cos_cb,
                    },
                ]);
            }
        }

        // The bisector leaves this triangle through the edge on the side of
        // c facing away from it.
        let exit = if cross(&bisector, &pc) > 0.0 {
            mesh.next(cur)
        } else {
            mesh.prev(cur)
        };
        cur = mesh.twin(exit)?;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Obtuse triangle 0-1-2 (apex 2) with a fan of triangles below it.
    fn obtuse_fan() -> TriangleMesh {
        let points = vec![
            Point::new(-1.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 0.2),
            Point::new(0.0, -1.5),
        ];
        TriangleMesh::from_triangles(points, &[[0, 1, 2], [0, 3, 1]]).unwrap()
    }

    fn edge_between(mesh: &TriangleMesh, from: VertexId, to: VertexId) -> EdgeId {
        (0..mesh.half_edge_count())
            .find(|&e| mesh.origin(e) == from && mesh.target(e) == to)
            .unwrap()
    }

    #[test]
    fn right_triangle_grid_is_not_obtuse() {
        let mesh = TriangleMesh::rectangle(0.0, 0.0, 1.0, 1.0, 3, 3).unwrap();
        let geometry = EdgeGeometry::build(&mesh, DEFAULT_SUPPORT_DEPTH);
        for h in 0..mesh.half_edge_count() {
            assert!(!geometry.is_non_acute(h), "half-edge {} flagged obtuse", h);
            assert!(geometry.virtual_support(h).is_none());
            let c = geometry.cos_phi(h);
            assert!(c.abs() < 1e-12 || (c - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
        }
    }

    #[test]
    fn obtuse_angle_gets_virtual_support() {
        let mesh = obtuse_fan();
        let geometry = EdgeGeometry::build(&mesh, DEFAULT_SUPPORT_DEPTH);
        let h = edge_between(&mesh, 0, 1);
        assert_eq!(apex(&mesh, h), 2);
        assert!(geometry.is_non_acute(h));

        let [first, second] = geometry.virtual_support(h).copied().unwrap();
        assert_eq!((first.a, first.b), (0, 3));
        assert_eq!((second.a, second.b), (3, 1));
        assert!(first.cos_phi > 0.0 && second.cos_phi > 0.0);
        assert_eq!(geometry.support_dependents(3), &[2]);
    }

    #[test]
    fn boundary_edge_has_no_support() {
        let points = vec![
            Point::new(-1.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 0.2),
        ];
        let mesh = TriangleMesh::from_triangles(points, &[[0, 1, 2]]).unwrap();
        let geometry = EdgeGeometry::build(&mesh, DEFAULT_SUPPORT_DEPTH);
        let h = edge_between(&mesh, 0, 1);
        assert!(geometry.is_non_acute(h));
        assert!(geometry.virtual_support(h).is_none());
    }

    #[test]
    fn search_respects_depth() {
        let mesh = obtuse_fan();
        let h = edge_between(&mesh, 0, 1);
        assert!(compute_virtual_support(&mesh, h, 0).is_none());
        assert!(compute_virtual_support(&mesh, h, 1).is_some());
    }

    #[test]
    fn search_walks_past_unsuitable_vertex() {
        // Vertex 3 lies close to the direction of vertex 0, so the angle
        // 3-2-1 stays obtuse; the walk must continue to vertex 4.
        let points = vec![
            Point::new(-1.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 0.2),
            Point::new(-0.6, -0.05),
            Point::new(0.0, -3.0),
        ];
        let mesh = TriangleMesh::from_triangles(
            points,
            &[[0, 1, 2], [0, 3, 1], [0, 4, 3], [3, 4, 1]],
        )
        .unwrap();
        let h = edge_between(&mesh, 0, 1);
        let [first, second] = compute_virtual_support(&mesh, h, DEFAULT_SUPPORT_DEPTH).unwrap();
        assert_eq!(first.b, 4);
        assert_eq!(second.a, 4);
    }
}

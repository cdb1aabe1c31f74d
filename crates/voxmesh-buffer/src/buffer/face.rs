use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use voxmesh_core::Tolerance;
use voxmesh_math::Vector3;

use super::{GeometryBuffer, VertexBuffer};

/// Triangles as vertex-index triples.
///
/// With the index built, [`faces_with`](Self::faces_with) answers "which faces touch this
/// vertex" in constant time per hit, since every column shares one index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceBuffer(GeometryBuffer<usize>);

impl FaceBuffer {
    pub fn new() -> Self {
        Self(GeometryBuffer::new())
    }

    pub fn from_triples(triples: Vec<[usize; 3]>) -> Self {
        Self(GeometryBuffer::from_triples(triples))
    }

    /// Faces referencing `vertex`, as `(face index, face)` pairs in face order.
    pub fn faces_with(&self, vertex: usize) -> Vec<(usize, [usize; 3])> {
        self.locate(vertex)
            .into_iter()
            .filter_map(|f| self.get(f).map(|face| (f, face)))
            .collect()
    }

    /// Indices of faces containing both endpoints of an edge.
    pub fn faces_with_edge(&self, a: usize, b: usize) -> Vec<usize> {
        self.faces_with(a)
            .into_iter()
            .filter(|(_, face)| face.contains(&b))
            .map(|(f, _)| f)
            .collect()
    }

    /// Every vertex sharing at least one face with `vertex`.
    pub fn neighbors_of(&self, vertex: usize) -> BTreeSet<usize> {
        self.edge_tally(vertex).into_keys().collect()
    }

    /// For each neighbour of `vertex`, the number of faces containing the edge between them.
    pub fn edge_tally(&self, vertex: usize) -> BTreeMap<usize, usize> {
        let mut tally = BTreeMap::new();
        for (_, face) in self.faces_with(vertex) {
            for v in face {
                if v != vertex {
                    *tally.entry(v).or_insert(0) += 1;
                }
            }
        }
        tally
    }

    /// Unit normal of a face by the right-hand rule over its first two edges.
    pub fn normal_of(&self, face: usize, vertices: &VertexBuffer) -> Option<Vector3> {
        let [a, b, c] = self.get(face)?;
        let p0 = vertices.point(a)?;
        let p1 = vertices.point(b)?;
        let p2 = vertices.point(c)?;
        Some((p1 - p0).cross(p2 - p0).normalize())
    }

    /// Endpoints of the hypotenuse when the face is a right triangle, `None` otherwise.
    pub fn hypotenuse_of(
        &self,
        face: usize,
        vertices: &VertexBuffer,
        tolerance: Tolerance,
    ) -> Option<[usize; 2]> {
        let ids = self.get(face)?;
        let mut edges = Vec::with_capacity(3);
        for k in 0..3 {
            let (a, b) = (ids[k], ids[(k + 1) % 3]);
            let len = vertices.point(a)?.distance_squared(vertices.point(b)?);
            edges.push((len, [a, b]));
        }
        edges.sort_by(|x, y| x.0.total_cmp(&y.0));
        let (legs, (hyp, ends)) = (edges[0].0 + edges[1].0, edges[2]);
        tolerance.linear_eq(legs, hyp).then_some(ends)
    }

    /// Drop rows repeated exactly (same vertices in the same order), keeping the first
    /// occurrence, and compact. Returns the number of rows dropped.
    pub fn ensure_uniqueness(&mut self) -> usize {
        let mut seen = HashSet::new();
        let repeats: Vec<usize> = self
            .iter_indexed()
            .filter(|(_, face)| !seen.insert(*face))
            .map(|(f, _)| f)
            .collect();
        if repeats.is_empty() {
            self.optimize();
            return 0;
        }
        self.remove_and_compact(&repeats)
    }

    /// Swap one vertex reference of a face. Returns `false` if the face is missing or does
    /// not reference `from`.
    pub fn replace(&mut self, face: usize, from: usize, to: usize) -> bool {
        let Some(mut row) = self.get(face) else {
            return false;
        };
        let Some(slot) = row.iter().position(|&v| v == from) else {
            return false;
        };
        row[slot] = to;
        self.update(face, row)
    }

    /// Rewrite every vertex reference `v` as `map[v]`; references beyond the map are kept.
    pub fn remap(&mut self, map: &[usize]) {
        self.map_in_place(|face| face.map(|v| map.get(v).copied().unwrap_or(v)));
    }

    /// Highest vertex id referenced by any face.
    pub fn max_vertex(&self) -> Option<usize> {
        self.iter().flatten().max()
    }
}

impl Deref for FaceBuffer {
    type Target = GeometryBuffer<usize>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for FaceBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec3;

    // unit square in z = 0 split along 0-2, plus a triangle hanging off edge 1-2
    fn fixture() -> (VertexBuffer, FaceBuffer) {
        let vertices = VertexBuffer::from_points([
            dvec3(0.0, 0.0, 0.0),
            dvec3(1.0, 0.0, 0.0),
            dvec3(1.0, 1.0, 0.0),
            dvec3(0.0, 1.0, 0.0),
            dvec3(2.0, 0.5, 0.0),
        ]);
        let mut faces = FaceBuffer::from_triples(vec![[0, 1, 2], [0, 2, 3], [1, 4, 2]]);
        faces.build_index();
        (vertices, faces)
    }

    #[test]
    fn test_adjacency() {
        let (_, faces) = fixture();
        assert_eq!(faces.faces_with(2), vec![(0, [0, 1, 2]), (1, [0, 2, 3]), (2, [1, 4, 2])]);
        assert_eq!(faces.faces_with_edge(0, 2), vec![0, 1]);
        assert_eq!(faces.faces_with_edge(3, 4), Vec::<usize>::new());
        assert_eq!(faces.neighbors_of(3), BTreeSet::from([0, 2]));
    }

    #[test]
    fn test_edge_tally() {
        let (_, faces) = fixture();
        let tally = faces.edge_tally(2);
        assert_eq!(tally, BTreeMap::from([(0, 2), (1, 2), (3, 1), (4, 1)]));
    }

    #[test]
    fn test_normal_of() {
        let (vertices, faces) = fixture();
        assert_eq!(faces.normal_of(0, &vertices), Some(dvec3(0.0, 0.0, 1.0)));
        assert_eq!(faces.normal_of(2, &vertices), Some(dvec3(0.0, 0.0, 1.0)));
        assert!(faces.normal_of(9, &vertices).is_none());
    }

    #[test]
    fn test_hypotenuse_of() {
        let (vertices, faces) = fixture();
        let tol = Tolerance::default();
        assert_eq!(faces.hypotenuse_of(0, &vertices, tol), Some([2, 0]));
        assert_eq!(faces.hypotenuse_of(1, &vertices, tol), Some([0, 2]));
        assert_eq!(faces.hypotenuse_of(2, &vertices, tol), None);
    }

    #[test]
    fn test_ensure_uniqueness() {
        let mut faces = FaceBuffer::from_triples(vec![[0, 1, 2], [2, 3, 0], [0, 1, 2], [1, 2, 0]]);
        faces.build_index();
        assert_eq!(faces.ensure_uniqueness(), 1);
        assert_eq!(faces.to_vec(), vec![[0, 1, 2], [2, 3, 0], [1, 2, 0]]);
        assert_eq!(faces.locate(3), vec![1]);
        assert_eq!(faces.ensure_uniqueness(), 0);
    }

    #[test]
    fn test_replace_and_remap() {
        let (_, mut faces) = fixture();
        assert!(faces.replace(2, 4, 7));
        assert!(!faces.replace(2, 4, 8));
        assert_eq!(faces.locate(7), vec![2]);
        assert!(faces.locate(4).is_empty());

        faces.remap(&[0, 1, 1, 2]);
        assert_eq!(faces.to_vec(), vec![[0, 1, 1], [0, 1, 2], [1, 7, 1]]);
        assert_eq!(faces.max_vertex(), Some(7));
    }
}

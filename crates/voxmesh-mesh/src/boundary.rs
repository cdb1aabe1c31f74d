use std::collections::{BTreeMap, BTreeSet, HashMap};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use voxmesh_buffer::IndexKey;
use voxmesh_core::{Result, VoxError};

use crate::mesh::Mesh;

/// A closed loop of boundary vertices. The closing edge runs from the last vertex back to
/// the first, which is not repeated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    pub vertices: Vec<usize>,
}

impl Boundary {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Consecutive vertex pairs, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = [usize; 2]> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |k| [self.vertices[k], self.vertices[(k + 1) % n]])
    }
}

impl Mesh {
    /// Edges carried by exactly `valence` faces, as `[low, high]` pairs.
    ///
    /// Tallies every vertex's neighbours through the face index; the per-vertex passes run
    /// in parallel and only read the mesh.
    pub(crate) fn edges_with_valence(&mut self, valence: usize) -> BTreeSet<[usize; 2]> {
        self.ensure_face_index();
        let faces = &self.faces;
        (0..self.vertices.len())
            .into_par_iter()
            .flat_map_iter(|i| {
                faces
                    .edge_tally(i)
                    .into_iter()
                    .filter(move |&(_, count)| count == valence)
                    .map(move |(n, _)| [i.min(n), i.max(n)])
            })
            .collect()
    }

    fn boundary_edges(&mut self) -> BTreeSet<[usize; 2]> {
        let dropped = self.faces.ensure_uniqueness();
        if dropped > 0 {
            debug!(dropped, "dropped repeated faces");
        }
        let edges = self.edges_with_valence(1);
        debug!(edges = edges.len(), "boundary edges found");
        edges
    }

    /// Assemble the boundary edges into closed loops and cache them on the mesh.
    ///
    /// A loop starts at the lowest remaining edge. When several unused edges continue the
    /// current tail, the one leading to the lowest vertex id is taken. A tail with no
    /// continuing edge is a [`VoxError::Topology`] error.
    pub fn find_boundaries(&mut self) -> Result<&[Boundary]> {
        let mut remaining = self.boundary_edges();
        let mut adjacency: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        for &[a, b] in &remaining {
            adjacency.entry(a).or_default().insert(b);
            adjacency.entry(b).or_default().insert(a);
        }
        let mut loops = Vec::new();
        while let Some(&[start, second]) = remaining.first() {
            take_edge(&mut remaining, &mut adjacency, start, second);
            let mut vertices = vec![start, second];
            let mut tail = second;
            while tail != start {
                let next = adjacency
                    .get(&tail)
                    .and_then(|s| s.first().copied())
                    .ok_or_else(|| {
                        VoxError::Topology(format!(
                            "boundary loop from vertex {start} has no edge continuing \
                             from vertex {tail}"
                        ))
                    })?;
                take_edge(&mut remaining, &mut adjacency, tail, next);
                vertices.push(next);
                tail = next;
            }
            vertices.pop();
            loops.push(Boundary { vertices });
        }

        info!(boundaries = loops.len(), "boundaries found");
        let loops = self.boundaries.insert(loops);
        Ok(loops.as_slice())
    }

    /// Cached loops from the last [`find_boundaries`](Self::find_boundaries), if any.
    pub fn boundaries(&self) -> Option<&[Boundary]> {
        self.boundaries.as_deref()
    }

    pub fn has_boundaries(&self) -> bool {
        self.boundaries.as_ref().is_some_and(|b| !b.is_empty())
    }

    pub fn clear_boundaries(&mut self) {
        self.boundaries = None;
    }

    /// Every vertex on a boundary edge, ascending.
    pub fn boundary_vertices(&mut self) -> Vec<usize> {
        let set: BTreeSet<usize> = self.boundary_edges().into_iter().flatten().collect();
        set.into_iter().collect()
    }

    /// Every face with at least one boundary edge, ascending.
    pub fn boundary_faces(&mut self) -> Vec<usize> {
        let edges = self.boundary_edges();
        let set: BTreeSet<usize> = edges
            .iter()
            .flat_map(|&[a, b]| self.faces.faces_with_edge(a, b))
            .collect();
        set.into_iter().collect()
    }

    /// Pairs of boundary vertices, one from each mesh, at exactly the same position.
    ///
    /// Boundaries are found first on either mesh that has none cached. Only loop pairs whose
    /// bounding boxes intersect are compared. Keys are vertices of `self`, values of `other`.
    pub fn shared_boundary_vertices(&mut self, other: &mut Mesh) -> Result<BTreeMap<usize, usize>> {
        if !self.has_boundaries() {
            self.find_boundaries()?;
        }
        if !other.has_boundaries() {
            other.find_boundaries()?;
        }
        let own = self.boundaries.clone().unwrap_or_default();
        let theirs = other.boundaries.clone().unwrap_or_default();

        let own_boxes = own
            .iter()
            .map(|b| self.subset_bounding_box(&b.vertices))
            .collect::<Result<Vec<_>>>()?;
        let their_boxes = theirs
            .iter()
            .map(|b| other.subset_bounding_box(&b.vertices))
            .collect::<Result<Vec<_>>>()?;

        let mut matches = BTreeMap::new();
        for (ob, obox) in own.iter().zip(&own_boxes) {
            for (tb, tbox) in theirs.iter().zip(&their_boxes) {
                let (Some(obox), Some(tbox)) = (obox, tbox) else {
                    continue;
                };
                if !obox.intersects(tbox) {
                    continue;
                }
                let mut positions: HashMap<[u64; 3], usize> = HashMap::new();
                for &v in &tb.vertices {
                    positions.entry(position_key(other.vertices.triple(v)?)).or_insert(v);
                }
                for &v in &ob.vertices {
                    if let Some(&w) = positions.get(&position_key(self.vertices.triple(v)?)) {
                        matches.insert(v, w);
                    }
                }
            }
        }
        debug!(shared = matches.len(), "shared boundary vertices");
        Ok(matches)
    }
}

fn take_edge(
    remaining: &mut BTreeSet<[usize; 2]>,
    adjacency: &mut BTreeMap<usize, BTreeSet<usize>>,
    a: usize,
    b: usize,
) {
    remaining.remove(&[a.min(b), a.max(b)]);
    if let Some(s) = adjacency.get_mut(&a) {
        s.remove(&b);
    }
    if let Some(s) = adjacency.get_mut(&b) {
        s.remove(&a);
    }
}

fn position_key(t: [f64; 3]) -> [u64; 3] {
    t.map(|x| x.key_bits())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec3;
    use voxmesh_buffer::{FaceBuffer, VectorBuffer, VertexBuffer};
    use voxmesh_math::Transform;

    // 2x1 strip of unit squares in z = 0
    fn strip() -> Mesh {
        Mesh::from_buffers(
            VertexBuffer::from_points([
                dvec3(0.0, 0.0, 0.0),
                dvec3(1.0, 0.0, 0.0),
                dvec3(2.0, 0.0, 0.0),
                dvec3(0.0, 1.0, 0.0),
                dvec3(1.0, 1.0, 0.0),
                dvec3(2.0, 1.0, 0.0),
            ]),
            VectorBuffer::new(),
            FaceBuffer::from_triples(vec![[0, 1, 4], [0, 4, 3], [1, 2, 5], [1, 5, 4]]),
        )
    }

    #[test]
    fn test_strip_has_one_loop() {
        let mut mesh = strip();
        let loops = mesh.find_boundaries().unwrap().to_vec();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].vertices, vec![0, 1, 2, 5, 4, 3]);
        assert_eq!(loops[0].edges().last(), Some([3, 0]));
        assert!(mesh.has_boundaries());

        mesh.clear_boundaries();
        assert!(mesh.boundaries().is_none());
    }

    #[test]
    fn test_boundary_vertices_and_faces() {
        let mut mesh = strip();
        assert_eq!(mesh.boundary_vertices(), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.boundary_faces(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_repeated_faces_are_ignored() {
        let mut mesh = strip();
        mesh.faces.append([[0, 1, 4]]);
        let loops = mesh.find_boundaries().unwrap();
        assert_eq!(loops.len(), 1);
        assert_eq!(mesh.face_count(), 4);
    }

    #[test]
    fn test_dead_end_is_an_error() {
        let mut mesh = strip();
        // the degenerate face leaves vertex 6 with a single boundary edge
        mesh.vertices.append([[-1.0, 1.0, 0.0]]);
        mesh.faces.append([[3, 6, 6]]);
        assert!(matches!(mesh.find_boundaries(), Err(VoxError::Topology(_))));
    }

    #[test]
    fn test_shared_boundary_vertices() {
        let mut left = strip();
        let mut right = strip();
        right.transform(&[Transform::translation(dvec3(2.0, 0.0, 0.0))]);
        let shared = left.shared_boundary_vertices(&mut right).unwrap();
        assert_eq!(shared, BTreeMap::from([(2, 0), (5, 3)]));

        let mut far = strip();
        far.transform(&[Transform::translation(dvec3(10.0, 0.0, 0.0))]);
        assert!(left.shared_boundary_vertices(&mut far).unwrap().is_empty());
    }
}

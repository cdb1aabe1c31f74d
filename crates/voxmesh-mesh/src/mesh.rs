use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use voxmesh_buffer::{FaceBuffer, VectorBuffer, VertexBuffer};
use voxmesh_core::{Bounded, Result, VoxError};
use voxmesh_math::{BoundingBox, Point3, Transform};

use crate::boundary::Boundary;
use crate::config::MeshConfig;

/// Indexed triangle mesh: positions, per-vertex normals and vertex-index faces.
///
/// Every face component is a valid index into `vertices`; the topology passes remap or
/// rewrite faces whenever they merge or split vertices so that this keeps holding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub name: Option<String>,
    pub vertices: VertexBuffer,
    pub normals: VectorBuffer,
    pub faces: FaceBuffer,
    pub config: MeshConfig,
    #[serde(skip)]
    pub(crate) boundaries: Option<Vec<Boundary>>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_buffers(vertices: VertexBuffer, normals: VectorBuffer, faces: FaceBuffer) -> Self {
        Self {
            vertices,
            normals,
            faces,
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: MeshConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// True when the normal buffer carries exactly one normal per vertex.
    pub fn has_vertex_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.vertices.len()
    }

    pub(crate) fn ensure_face_index(&mut self) {
        if !self.faces.is_indexed() {
            self.faces.build_index();
        }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.vertices.bounds()
    }

    /// Bounding box of the listed vertices. Fails if any index is out of range.
    pub fn subset_bounding_box(&self, indices: &[usize]) -> Result<Option<BoundingBox>> {
        let points = indices
            .iter()
            .map(|&i| self.vertices.triple(i).map(Point3::from_array))
            .collect::<Result<Vec<_>>>()?;
        Ok(BoundingBox::from_points(points))
    }

    /// Centre of the bounding box.
    pub fn center(&self) -> Option<Point3> {
        self.bounding_box().map(|b| b.center())
    }

    /// Apply a sequence of transforms to every vertex, first transform first.
    /// Normals are left untouched.
    pub fn transform(&mut self, transforms: &[Transform]) -> &mut Self {
        let m = Transform::chain(transforms);
        self.vertices
            .map_in_place(|t| m.transform_point(Point3::from_array(t)).to_array());
        self
    }

    /// Like [`transform`](Self::transform) but only for the listed vertices.
    pub fn subset_transform(
        &mut self,
        indices: &[usize],
        transforms: &[Transform],
    ) -> Result<&mut Self> {
        let m = Transform::chain(transforms);
        let subset: BTreeSet<usize> = indices.iter().copied().collect();
        for i in subset {
            let p = Point3::from_array(self.vertices.triple(i)?);
            self.vertices.set(i, m.transform_point(p).to_array())?;
        }
        Ok(self)
    }

    /// Number of faces on every edge, keyed by `[low, high]` vertex pair.
    pub fn edge_valences(&self) -> BTreeMap<[usize; 2], usize> {
        let mut valences = BTreeMap::new();
        for [a, b, c] in self.faces.iter() {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                *valences.entry([u.min(v), u.max(v)]).or_insert(0) += 1;
            }
        }
        valences
    }

    /// Fail on the first edge shared by more than two faces.
    pub fn ensure_manifold(&self) -> Result<()> {
        match self.edge_valences().into_iter().find(|&(_, n)| n > 2) {
            Some(([v0, v1], faces)) => Err(VoxError::NonManifold { v0, v1, faces }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::dvec3;
    use voxmesh_math::Axis;

    fn tetrahedron() -> Mesh {
        Mesh::from_buffers(
            VertexBuffer::from_points([
                dvec3(0.0, 0.0, 0.0),
                dvec3(2.0, 0.0, 0.0),
                dvec3(0.0, 4.0, 0.0),
                dvec3(0.0, 0.0, 6.0),
            ]),
            VectorBuffer::new(),
            FaceBuffer::from_triples(vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]]),
        )
    }

    #[test]
    fn test_bounds_and_center() {
        let mesh = tetrahedron();
        let bb = mesh.bounding_box().unwrap();
        assert_eq!(bb.terminus, dvec3(2.0, 4.0, 6.0));
        assert_eq!(mesh.center(), Some(dvec3(1.0, 2.0, 3.0)));

        let sub = mesh.subset_bounding_box(&[0, 1]).unwrap().unwrap();
        assert_eq!(sub.terminus, dvec3(2.0, 0.0, 0.0));
        assert!(mesh.subset_bounding_box(&[0, 9]).is_err());
        assert!(Mesh::new().bounding_box().is_none());
    }

    #[test]
    fn test_transform_order() {
        let mut mesh = tetrahedron();
        mesh.transform(&[
            Transform::translation(dvec3(1.0, 0.0, 0.0)),
            Transform::rotation_about(std::f64::consts::FRAC_PI_2, Axis::Z),
        ]);
        // (0,0,0) -> (1,0,0) -> (0,1,0)
        let p = mesh.vertices.point(0).unwrap();
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_subset_transform() {
        let mut mesh = tetrahedron();
        mesh.subset_transform(&[1, 3, 3], &[Transform::scale(dvec3(0.5, 0.5, 0.5))])
            .unwrap();
        assert_eq!(mesh.vertices.point(1), Some(dvec3(1.0, 0.0, 0.0)));
        assert_eq!(mesh.vertices.point(2), Some(dvec3(0.0, 4.0, 0.0)));
        assert_eq!(mesh.vertices.point(3), Some(dvec3(0.0, 0.0, 3.0)));
        assert!(mesh.subset_transform(&[4], &[Transform::identity()]).is_err());
    }

    #[test]
    fn test_closed_surface_is_manifold() {
        let mesh = tetrahedron();
        let valences = mesh.edge_valences();
        assert_eq!(valences.len(), 6);
        assert!(valences.values().all(|&n| n == 2));
        assert!(mesh.ensure_manifold().is_ok());
    }

    #[test]
    fn test_fin_is_not_manifold() {
        let mut mesh = tetrahedron();
        mesh.vertices.append([[0.0, -1.0, 0.0]]);
        mesh.faces.append([[0, 1, 4]]);
        assert!(matches!(
            mesh.ensure_manifold(),
            Err(VoxError::NonManifold { v0: 0, v1: 1, faces: 3 })
        ));
    }
}

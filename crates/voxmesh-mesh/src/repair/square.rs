use std::collections::{BTreeSet, HashMap};

use slotmap::{new_key_type, SlotMap};
use voxmesh_buffer::IndexKey;
use voxmesh_core::{Result, Tolerance, VoxError};
use voxmesh_math::{Point3, Vector3};

use crate::mesh::Mesh;

new_key_type! {
    pub struct SquareId;
}

/// One corner of a square: the original vertex, a replacement, or several coincident copies
/// after a split that the square has to be retriangulated around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Corner {
    Single(usize),
    Split(Vec<usize>),
}

impl Corner {
    pub fn ids(&self) -> &[usize] {
        match self {
            Corner::Single(v) => std::slice::from_ref(v),
            Corner::Split(vs) => vs,
        }
    }
}

/// Two right triangles sharing a unit-square diagonal.
#[derive(Debug, Clone)]
pub(crate) struct Square {
    pub faces: [usize; 2],
    /// Distinct vertices of both faces as loaded, in face order
    pub original: Vec<usize>,
    /// Current state of each entry of `original`
    pub corners: Vec<Corner>,
    pub half_normal: Vector3,
    /// Centroid pushed out by the half-normal
    pub half_normal_point: Point3,
}

impl Square {
    /// Every vertex the square now spans, split copies included.
    pub fn vertices(&self) -> Vec<usize> {
        let mut seen = BTreeSet::new();
        self.corners
            .iter()
            .flat_map(Corner::ids)
            .copied()
            .filter(|v| seen.insert(*v))
            .collect()
    }

    /// Swap the corner still holding `vertex` for `with`.
    pub fn replace_corner(&mut self, vertex: usize, with: Corner) {
        if let Some(c) = self
            .corners
            .iter_mut()
            .find(|c| **c == Corner::Single(vertex))
        {
            *c = with;
        }
    }

    /// The corner that was split into several copies, if any.
    pub fn split_corner(&self) -> Option<&[usize]> {
        self.corners.iter().find_map(|c| match c {
            Corner::Split(vs) => Some(vs.as_slice()),
            Corner::Single(_) => None,
        })
    }

    /// What `original[k]` maps to, for squares with no split corner.
    pub fn mapped(&self, vertex: usize) -> usize {
        self.original
            .iter()
            .position(|&v| v == vertex)
            .and_then(|k| match &self.corners[k] {
                Corner::Single(w) => Some(*w),
                Corner::Split(_) => None,
            })
            .unwrap_or(vertex)
    }

    pub fn half_normal_point_key(&self) -> [u64; 3] {
        self.half_normal_point.to_array().map(|x| x.key_bits())
    }
}

/// All squares met so far, shared between the seam vertices that touch them.
#[derive(Default)]
pub(crate) struct SquareSet {
    pub squares: SlotMap<SquareId, Square>,
    by_faces: HashMap<[usize; 2], SquareId>,
}

impl SquareSet {
    /// Squares touching `vertex`, in order of their lowest incident face.
    pub fn around(
        &mut self,
        mesh: &Mesh,
        vertex: usize,
        tolerance: Tolerance,
    ) -> Result<Vec<SquareId>> {
        let mut ids = Vec::new();
        for (f, _) in mesh.faces.faces_with(vertex) {
            let id = self.square_of(mesh, f, tolerance)?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn square_of(&mut self, mesh: &Mesh, face: usize, tolerance: Tolerance) -> Result<SquareId> {
        let not_unit = || VoxError::Geometry(format!("face {face} is not a right unit triangle"));
        let [a, b] = mesh
            .faces
            .hypotenuse_of(face, &mesh.vertices, tolerance)
            .ok_or_else(not_unit)?;
        let diagonal = mesh.vertices.distance_between(a, b).ok_or_else(not_unit)?;
        if !tolerance.is_diagonal(diagonal) {
            return Err(not_unit());
        }

        let partners: Vec<usize> = mesh
            .faces
            .faces_with_edge(a, b)
            .into_iter()
            .filter(|&f| f != face)
            .collect();
        let [partner] = partners[..] else {
            return Err(VoxError::Geometry(format!(
                "diagonal ({a}, {b}) of face {face} is shared by {} other faces",
                partners.len()
            )));
        };

        let key = [face.min(partner), face.max(partner)];
        if let Some(&id) = self.by_faces.get(&key) {
            return Ok(id);
        }

        let square = Self::build(mesh, [face, partner])?;
        let id = self.squares.insert(square);
        self.by_faces.insert(key, id);
        Ok(id)
    }

    fn build(mesh: &Mesh, faces: [usize; 2]) -> Result<Square> {
        let mut original = Vec::with_capacity(4);
        for f in faces {
            for v in mesh.faces.triple(f)? {
                if !original.contains(&v) {
                    original.push(v);
                }
            }
        }
        let normal = mesh
            .faces
            .normal_of(faces[0], &mesh.vertices)
            .ok_or_else(|| VoxError::Geometry(format!("face {} has a missing vertex", faces[0])))?;
        let half_normal = normal * 0.5;
        let centroid = mesh
            .vertices
            .average_of(&original)
            .ok_or_else(|| VoxError::Geometry(format!("square {faces:?} has a missing vertex")))?;

        Ok(Square {
            faces,
            corners: original.iter().map(|&v| Corner::Single(v)).collect(),
            original,
            half_normal,
            half_normal_point: centroid + half_normal,
        })
    }
}

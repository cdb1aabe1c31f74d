use voxmesh_core::{Result, Validate, VoxError};

use crate::mesh::Mesh;

impl Validate for Mesh {
    fn validate(&self) -> Result<()> {
        let n = self.vertices.len();

        // 1. Every face references existing vertices
        for (f, face) in self.faces.iter_indexed() {
            if let Some(&v) = face.iter().find(|&&v| v >= n) {
                return Err(VoxError::Topology(format!(
                    "Face {f} references vertex {v} but the mesh has {n} vertices"
                )));
            }
        }

        // 2. Cached boundaries still point at vertices
        for boundary in self.boundaries().unwrap_or_default() {
            if let Some(&v) = boundary.vertices.iter().find(|&&v| v >= n) {
                return Err(VoxError::Topology(format!(
                    "Boundary references vertex {v} but the mesh has {n} vertices"
                )));
            }
        }

        Ok(())
    }
}

use serde::{Deserialize, Serialize};
use voxmesh_core::Tolerance;

/// Knobs for loading, writing and repairing meshes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshConfig {
    pub tolerance: Tolerance,
    /// Merge coincident vertices after an STL load
    pub unify_on_load: bool,
    /// Replace `facet normal 0 0 0` with the right-hand-rule normal
    pub compute_missing_normals: bool,
    /// Decimal places for coordinates and normals in STL output
    pub stl_precision: u32,
    /// Distance split vertex copies are pushed apart by the non-manifold repair
    pub nudge_distance: f64,
}

impl MeshConfig {
    pub const DEFAULT_STL_PRECISION: u32 = 5;
    pub const DEFAULT_NUDGE_DISTANCE: f64 = 0.001;

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn raw() -> Self {
        Self {
            unify_on_load: false,
            compute_missing_normals: false,
            ..Self::default()
        }
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            unify_on_load: true,
            compute_missing_normals: true,
            stl_precision: Self::DEFAULT_STL_PRECISION,
            nudge_distance: Self::DEFAULT_NUDGE_DISTANCE,
        }
    }
}

mod face;
mod geometry;
mod iter;
mod vector;
mod vertex;

pub use face::FaceBuffer;
pub use geometry::{GeometryBuffer, Scalar};
pub use iter::TripleIter;
pub use vector::VectorBuffer;
pub use vertex::VertexBuffer;

use voxmesh_math::DVec3;

#[inline]
pub(crate) fn to_dvec3(t: [f64; 3]) -> DVec3 {
    DVec3::from_array(t)
}

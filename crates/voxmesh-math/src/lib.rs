pub mod aabb;
pub mod line;
pub mod transform;

pub use glam::{DMat4, DVec3, DVec4};
pub use aabb::BoundingBox;
pub use line::Line;
pub use transform::{Axis, Transform};

pub type Point3 = DVec3;
pub type Vector3 = DVec3;

use crate::{DMat4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Coordinate axis, used to name a rotation axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Vector3 {
        match self {
            Axis::X => Vector3::X,
            Axis::Y => Vector3::Y,
            Axis::Z => Vector3::Z,
        }
    }
}

/// Homogeneous 4x4 transform (rotation, translation, scale).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Transform {
    pub matrix: [f64; 16],
}

impl Transform {
    pub fn identity() -> Self {
        Self::from_mat4(DMat4::IDENTITY)
    }

    pub fn translation(t: Vector3) -> Self {
        Self::from_mat4(DMat4::from_translation(t))
    }

    /// Per-axis scale; use `Vector3::splat` for a uniform factor.
    pub fn scale(s: Vector3) -> Self {
        Self::from_mat4(DMat4::from_scale(s))
    }

    /// Right-handed rotation of `theta` radians about `axis`, which need not be normalized.
    pub fn rotation(theta: f64, axis: Vector3) -> Self {
        Self::from_mat4(DMat4::from_axis_angle(axis.normalize(), theta))
    }

    pub fn rotation_about(theta: f64, axis: Axis) -> Self {
        Self::rotation(theta, axis.unit())
    }

    pub fn from_mat4(m: DMat4) -> Self {
        Self {
            matrix: m.to_cols_array(),
        }
    }

    pub fn to_mat4(&self) -> DMat4 {
        DMat4::from_cols_array(&self.matrix)
    }

    /// Apply to a point, dividing through by the homogeneous coordinate.
    pub fn transform_point(&self, p: Point3) -> Point3 {
        self.to_mat4().project_point3(p)
    }

    pub fn transform_vector(&self, v: Vector3) -> Vector3 {
        self.to_mat4().transform_vector3(v)
    }

    /// `self` followed by `other`.
    pub fn then(&self, other: &Transform) -> Transform {
        Self::from_mat4(other.to_mat4() * self.to_mat4())
    }

    /// Compose a sequence applied in order: the first transform acts first.
    pub fn chain<'a, I>(transforms: I) -> Transform
    where
        I: IntoIterator<Item = &'a Transform>,
    {
        transforms
            .into_iter()
            .fold(Transform::identity(), |acc, t| acc.then(t))
    }

    pub fn inverse(&self) -> Option<Transform> {
        let m = self.to_mat4();
        if m.determinant().abs() < 1e-15 {
            None
        } else {
            Some(Self::from_mat4(m.inverse()))
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

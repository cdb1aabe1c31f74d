use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use voxmesh_core::Tolerance;
use voxmesh_math::Vector3;

use super::{to_dvec3, GeometryBuffer};

/// Direction vectors, typically per-vertex normals.
///
/// Zero-length rows are a caller error: normalizing one yields NaN components.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorBuffer(GeometryBuffer<f64>);

impl VectorBuffer {
    pub fn new() -> Self {
        Self(GeometryBuffer::new())
    }

    pub fn from_triples(triples: Vec<[f64; 3]>) -> Self {
        Self(GeometryBuffer::from_triples(triples))
    }

    pub fn from_vectors<I>(vectors: I) -> Self
    where
        I: IntoIterator<Item = Vector3>,
    {
        Self(vectors.into_iter().map(|v| v.to_array()).collect())
    }

    pub fn vector(&self, index: usize) -> Option<Vector3> {
        self.get(index).map(to_dvec3)
    }

    pub fn vectors(&self) -> Vec<Vector3> {
        self.iter().map(to_dvec3).collect()
    }

    pub fn append_vectors<I>(&mut self, vectors: I) -> Vec<usize>
    where
        I: IntoIterator<Item = Vector3>,
    {
        self.append(vectors.into_iter().map(|v| v.to_array()))
    }

    pub fn length_of(&self, index: usize) -> Option<f64> {
        self.vector(index).map(|v| v.length())
    }

    /// Unit-length copy of a row, leaving the buffer untouched.
    pub fn normal_of(&self, index: usize) -> Option<Vector3> {
        self.vector(index).map(|v| v / v.length())
    }

    /// Normalize one row in place.
    pub fn normalize(&mut self, index: usize) -> bool {
        match self.normal_of(index) {
            Some(n) => self.update(index, n.to_array()),
            None => false,
        }
    }

    pub fn normalize_all(&mut self) {
        self.map_in_place(|t| {
            let v = to_dvec3(t);
            (v / v.length()).to_array()
        });
    }

    pub fn is_unit(&self, index: usize, tolerance: Tolerance) -> Option<bool> {
        self.length_of(index)
            .map(|len| tolerance.linear_eq(len, 1.0))
    }

    pub fn cross(&self, a: usize, b: usize) -> Option<Vector3> {
        Some(self.vector(a)?.cross(self.vector(b)?))
    }

    pub fn dot(&self, a: usize, b: usize) -> Option<f64> {
        Some(self.vector(a)?.dot(self.vector(b)?))
    }

    /// Normalized mean of the given rows; `None` if the list is empty or any index is missing.
    pub fn average_normal(&self, indices: &[usize]) -> Option<Vector3> {
        if indices.is_empty() {
            return None;
        }
        let mut sum = Vector3::ZERO;
        for &i in indices {
            sum += self.vector(i)?;
        }
        Some((sum / indices.len() as f64).normalize())
    }
}

impl Deref for VectorBuffer {
    type Target = GeometryBuffer<f64>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for VectorBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::dvec3;

    #[test]
    fn test_normalize() {
        let mut vectors = VectorBuffer::from_triples(vec![[3.0, 0.0, 4.0], [0.0, 2.0, 0.0]]);
        assert_relative_eq!(vectors.length_of(0).unwrap(), 5.0);
        assert_eq!(vectors.is_unit(0, Tolerance::default()), Some(false));

        assert!(vectors.normalize(0));
        assert_relative_eq!(vectors.vector(0).unwrap().z, 0.8);
        assert_eq!(vectors.is_unit(0, Tolerance::default()), Some(true));

        vectors.normalize_all();
        assert_eq!(vectors.vector(1), Some(dvec3(0.0, 1.0, 0.0)));
        assert!(!vectors.normalize(2));
    }

    #[test]
    fn test_products() {
        let vectors = VectorBuffer::from_vectors([dvec3(1.0, 0.0, 0.0), dvec3(0.0, 1.0, 0.0)]);
        assert_eq!(vectors.cross(0, 1), Some(dvec3(0.0, 0.0, 1.0)));
        assert_eq!(vectors.dot(0, 1), Some(0.0));
        assert!(vectors.cross(0, 5).is_none());
    }

    #[test]
    fn test_average_normal() {
        let vectors = VectorBuffer::from_vectors([
            dvec3(1.0, 0.0, 0.0),
            dvec3(0.0, 1.0, 0.0),
            dvec3(1.0, 0.0, 0.0),
        ]);
        let n = vectors.average_normal(&[0, 1]).unwrap();
        assert_relative_eq!(n.x, std::f64::consts::FRAC_1_SQRT_2);
        assert_relative_eq!(n.y, std::f64::consts::FRAC_1_SQRT_2);
        assert_eq!(vectors.average_normal(&[0, 2]), Some(dvec3(1.0, 0.0, 0.0)));
        assert!(vectors.average_normal(&[]).is_none());
    }
}

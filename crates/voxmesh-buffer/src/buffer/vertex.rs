use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use voxmesh_core::Bounded;
use voxmesh_math::{BoundingBox, Line, Point3, Vector3};

use super::{to_dvec3, GeometryBuffer};

/// Vertex positions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexBuffer(GeometryBuffer<f64>);

impl VertexBuffer {
    pub fn new() -> Self {
        Self(GeometryBuffer::new())
    }

    pub fn from_triples(triples: Vec<[f64; 3]>) -> Self {
        Self(GeometryBuffer::from_triples(triples))
    }

    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point3>,
    {
        Self(points.into_iter().map(|p| p.to_array()).collect())
    }

    pub fn point(&self, index: usize) -> Option<Point3> {
        self.get(index).map(to_dvec3)
    }

    pub fn points(&self) -> Vec<Point3> {
        self.iter().map(to_dvec3).collect()
    }

    pub fn append_points<I>(&mut self, points: I) -> Vec<usize>
    where
        I: IntoIterator<Item = Point3>,
    {
        self.append(points.into_iter().map(|p| p.to_array()))
    }

    pub fn distance_to(&self, index: usize, point: Point3) -> Option<f64> {
        self.point(index).map(|p| p.distance(point))
    }

    pub fn distance_between(&self, a: usize, b: usize) -> Option<f64> {
        Some(self.point(a)?.distance(self.point(b)?))
    }

    /// Distance from a vertex to the infinite line through `line`.
    pub fn distance_from_line(&self, index: usize, line: &Line) -> Option<f64> {
        self.point(index).map(|p| line.distance_to_point(p))
    }

    pub fn distance_from_segment(&self, index: usize, segment: &Line) -> Option<f64> {
        self.point(index).map(|p| segment.distance_to_segment(p))
    }

    /// Move one vertex by `offset`; returns `false` if the index is out of range.
    pub fn translate(&mut self, index: usize, offset: Vector3) -> bool {
        match self.point(index) {
            Some(p) => self.update(index, (p + offset).to_array()),
            None => false,
        }
    }

    pub fn translate_all(&mut self, offset: Vector3) {
        self.map_in_place(|t| (to_dvec3(t) + offset).to_array());
    }

    pub fn scale_all(&mut self, factor: Vector3) {
        self.map_in_place(|t| (to_dvec3(t) * factor).to_array());
    }

    /// Centroid of the given vertices; `None` if the list is empty or any index is missing.
    pub fn average_of(&self, indices: &[usize]) -> Option<Point3> {
        if indices.is_empty() {
            return None;
        }
        let mut sum = Point3::ZERO;
        for &i in indices {
            sum += self.point(i)?;
        }
        Some(sum / indices.len() as f64)
    }
}

impl Deref for VertexBuffer {
    type Target = GeometryBuffer<f64>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for VertexBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Bounded for VertexBuffer {
    type Bounds = BoundingBox;

    fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.iter().map(to_dvec3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::dvec3;

    fn square() -> VertexBuffer {
        VertexBuffer::from_triples(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ])
    }

    #[test]
    fn test_distances() {
        let vertices = square();
        assert_relative_eq!(vertices.distance_between(0, 2).unwrap(), 2f64.sqrt());
        assert_relative_eq!(vertices.distance_to(1, dvec3(1.0, 0.0, 2.0)).unwrap(), 2.0);
        assert!(vertices.distance_between(0, 9).is_none());
    }

    #[test]
    fn test_line_and_segment_distance() {
        let vertices = VertexBuffer::from_points([dvec3(4.0, 4.0, 0.0), dvec3(-3.0, 4.0, 0.0)]);
        let line = Line::new(dvec3(0.0, 0.0, 0.0), dvec3(1.0, 0.0, 0.0));
        assert_relative_eq!(vertices.distance_from_line(0, &line).unwrap(), 4.0);
        assert_relative_eq!(vertices.distance_from_segment(0, &line).unwrap(), 5.0);
        assert_relative_eq!(vertices.distance_from_segment(1, &line).unwrap(), 5.0);
    }

    #[test]
    fn test_translate() {
        let mut vertices = square();
        vertices.build_index();
        assert!(vertices.translate(2, dvec3(0.0, 0.0, 0.5)));
        assert_eq!(vertices.point(2), Some(dvec3(1.0, 1.0, 0.5)));
        assert_eq!(vertices.locate(0.5), vec![2]);
        assert!(!vertices.translate(7, dvec3(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_translate_and_scale_all() {
        let mut vertices = square();
        vertices.scale_all(dvec3(2.0, 2.0, 1.0));
        vertices.translate_all(dvec3(1.0, 0.0, 0.0));
        assert_eq!(vertices.point(2), Some(dvec3(3.0, 2.0, 0.0)));
    }

    #[test]
    fn test_average_and_bounds() {
        let vertices = square();
        assert_eq!(vertices.average_of(&[0, 1, 2, 3]), Some(dvec3(0.5, 0.5, 0.0)));
        assert!(vertices.average_of(&[]).is_none());

        let bounds = vertices.bounds().unwrap();
        assert_eq!(bounds.origin, dvec3(0.0, 0.0, 0.0));
        assert_eq!(bounds.terminus, dvec3(1.0, 1.0, 0.0));
        assert!(VertexBuffer::new().bounds().is_none());
    }
}

use crate::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A line through two points; also read as the segment between them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Line {
    pub start: Point3,
    pub end: Point3,
}

impl Line {
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    pub fn direction(&self) -> Vector3 {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.direction().length()
    }

    /// Distance from a point to the infinite line through `start` and `end`.
    pub fn distance_to_point(&self, point: Point3) -> f64 {
        let dir = self.direction();
        (point - self.start).cross(dir).length() / dir.length()
    }

    /// Closest point to `point` on the segment between `start` and `end`.
    pub fn closest_point_on_segment(&self, point: Point3) -> Point3 {
        let dir = self.direction();
        let t = ((point - self.start).dot(dir) / dir.length_squared()).clamp(0.0, 1.0);
        self.start + dir * t
    }

    /// Distance from a point to the segment between `start` and `end`.
    pub fn distance_to_segment(&self, point: Point3) -> f64 {
        (point - self.closest_point_on_segment(point)).length()
    }
}

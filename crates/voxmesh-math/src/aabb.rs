use crate::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Axis-aligned box between a minimum corner (`origin`) and a maximum corner (`terminus`).
///
/// The constructor sorts the corners per axis, so `origin <= terminus` holds componentwise
/// for every box; all derived measures are pure functions of the two corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub origin: Point3,
    pub terminus: Point3,
}

impl BoundingBox {
    pub fn new(a: Point3, b: Point3) -> Self {
        Self {
            origin: a.min(b),
            terminus: a.max(b),
        }
    }

    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (origin, terminus) = points
            .fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { origin, terminus })
    }

    /// Smallest box enclosing every box in `boxes`.
    pub fn enclosing<'a, I>(boxes: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        boxes.into_iter().copied().reduce(|acc, b| acc.merge(&b))
    }

    pub fn width(&self) -> f64 {
        self.terminus.x - self.origin.x
    }

    pub fn height(&self) -> f64 {
        self.terminus.y - self.origin.y
    }

    pub fn depth(&self) -> f64 {
        self.terminus.z - self.origin.z
    }

    pub fn volume(&self) -> f64 {
        self.width() * self.height() * self.depth()
    }

    pub fn diagonal_length(&self) -> f64 {
        self.extents().length()
    }

    pub fn center(&self) -> Point3 {
        (self.origin + self.terminus) * 0.5
    }

    pub fn extents(&self) -> Vector3 {
        self.terminus - self.origin
    }

    pub fn left(&self) -> f64 {
        self.origin.x
    }

    pub fn right(&self) -> f64 {
        self.terminus.x
    }

    pub fn bottom(&self) -> f64 {
        self.origin.y
    }

    pub fn top(&self) -> f64 {
        self.terminus.y
    }

    pub fn back(&self) -> f64 {
        self.origin.z
    }

    pub fn front(&self) -> f64 {
        self.terminus.z
    }

    pub fn contains(&self, p: Point3) -> bool {
        p.x >= self.origin.x
            && p.x <= self.terminus.x
            && p.y >= self.origin.y
            && p.y <= self.terminus.y
            && p.z >= self.origin.z
            && p.z <= self.terminus.z
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.origin.x <= other.terminus.x
            && self.terminus.x >= other.origin.x
            && self.origin.y <= other.terminus.y
            && self.terminus.y >= other.origin.y
            && self.origin.z <= other.terminus.z
            && self.terminus.z >= other.origin.z
    }

    /// Overlapping region of two boxes, `None` when they are disjoint.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self {
            origin: self.origin.max(other.origin),
            terminus: self.terminus.min(other.terminus),
        })
    }

    pub fn merge(&self, other: &Self) -> Self {
        Self {
            origin: self.origin.min(other.origin),
            terminus: self.terminus.max(other.terminus),
        }
    }

    pub fn expand(&self, amount: f64) -> Self {
        let offset = Vector3::splat(amount);
        Self::new(self.origin - offset, self.terminus + offset)
    }
}

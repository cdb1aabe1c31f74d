use crate::error::Result;

/// Validate structural integrity of a geometric/topological entity.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Compute an axis-aligned bounding box, `None` when there is nothing to bound.
pub trait Bounded {
    type Bounds;
    fn bounds(&self) -> Option<Self::Bounds>;
}

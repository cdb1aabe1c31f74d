pub mod buffer;
pub mod value_index;

pub use buffer::{FaceBuffer, GeometryBuffer, Scalar, TripleIter, VectorBuffer, VertexBuffer};
pub use value_index::{IndexKey, ValueIndex};

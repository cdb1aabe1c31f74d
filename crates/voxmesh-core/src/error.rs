use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoxError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unrecognized format: {0}")]
    UnrecognizedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index {index} out of range for a buffer of {len} triples")]
    OutOfRange { index: usize, len: usize },

    #[error("Topology error: {0}")]
    Topology(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error(
        "Un-classifiable vertex {vertex}: {edges} non-manifold edges, \
         {squares} squares, {groups} groups"
    )]
    UnclassifiableVertex {
        vertex: usize,
        edges: usize,
        squares: usize,
        groups: usize,
    },

    #[error("Vertex {vertex} was split into {copies} copies but has {groups} square groups")]
    SplitMismatch {
        vertex: usize,
        copies: usize,
        groups: usize,
    },

    #[error("Edge ({v0}, {v1}) is shared by {faces} faces")]
    NonManifold { v0: usize, v1: usize, faces: usize },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, VoxError>;

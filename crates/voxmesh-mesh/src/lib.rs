pub mod boundary;
pub mod config;
mod dedup;
pub mod io;
pub mod mesh;
pub mod repair;
mod validate;

pub use boundary::Boundary;
pub use config::MeshConfig;
pub use io::MeshFormat;
pub use mesh::Mesh;
pub use repair::{RepairReport, SeamVertexKind};

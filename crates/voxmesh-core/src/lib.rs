pub mod error;
pub mod tolerance;
pub mod traits;

pub use error::{Result, VoxError};
pub use tolerance::Tolerance;
pub use traits::{Bounded, Validate};

pub mod distiller;
pub mod error;
pub mod prompt;
pub mod repair;

pub use distiller::Distiller;
pub use error::{DistillError, Result};

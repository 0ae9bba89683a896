pub mod error;
pub mod manager;

pub use error::{ContextError, Result};
pub use manager::ContextManager;

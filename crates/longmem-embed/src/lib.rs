pub mod embedder;
pub mod error;

pub use embedder::{EmbedCache, Embedder, HashingEmbedder};
pub use error::{EmbeddingError, Result};

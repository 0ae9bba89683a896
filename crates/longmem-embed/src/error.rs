use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding model unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, EmbeddingError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("store error: {0}")]
    Store(#[from] longmem_store::StoreError),

    #[error("retrieval error: {0}")]
    Retrieve(#[from] longmem_retrieve::RetrieveError),

    #[error("context configuration error: {0}")]
    Context(#[from] longmem_context::ContextError),

    #[error("llm error: {0}")]
    Llm(#[from] longmem_llm::LlmError),

    #[error("embedding error: {0}")]
    Embedding(#[from] longmem_embed::EmbeddingError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

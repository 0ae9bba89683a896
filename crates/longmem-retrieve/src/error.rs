use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("store error: {0}")]
    Store(#[from] longmem_store::StoreError),
}

pub type Result<T> = std::result::Result<T, RetrieveError>;

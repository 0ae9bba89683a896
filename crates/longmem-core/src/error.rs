use thiserror::Error;

/// Errors raised while loading or validating a `LongmemConfig`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

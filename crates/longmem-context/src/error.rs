use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("keep_tail_n ({keep_tail_n}) leaves utilization at {utilization:.2}, still >= flush_threshold ({flush_threshold:.2})")]
    ConfigError {
        keep_tail_n: usize,
        utilization: f64,
        flush_threshold: f64,
    },
}

pub type Result<T> = std::result::Result<T, ContextError>;

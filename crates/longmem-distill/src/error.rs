use thiserror::Error;

#[derive(Debug, Error)]
pub enum DistillError {
    #[error("llm error: {0}")]
    Llm(#[from] longmem_llm::LlmError),

    /// Unrecoverable JSON parse failure after best-effort repair. Never
    /// propagated to the orchestrator as a hard error — `Distiller::distill`
    /// catches this internally and returns an empty delta instead.
    #[error("could not parse distilled delta: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, DistillError>;

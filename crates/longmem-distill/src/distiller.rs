use tracing::warn;

use longmem_core::types::{DistilledMemory, Memory, TurnRecord};
use longmem_llm::LlmClient;

use crate::prompt::build_prompt;
use crate::repair::parse_delta;

/// Converts a window of turns plus the current active memory set into a
/// delta of memory actions via one `json_complete` call. The only
/// non-deterministic, lossy component in the pipeline — failures here (both
/// transport errors and unrecoverable parse errors) are swallowed into an
/// empty delta rather than propagated, so one bad distillation pass degrades
/// gracefully instead of taking down the turn loop.
pub struct Distiller<'a> {
    llm: &'a dyn LlmClient,
    max_tokens: u32,
}

impl<'a> Distiller<'a> {
    pub fn new(llm: &'a dyn LlmClient, max_tokens: u32) -> Self {
        Self { llm, max_tokens }
    }

    pub async fn distill(&self, window: &[TurnRecord], active_memories: &[Memory]) -> Vec<DistilledMemory> {
        if window.is_empty() {
            return Vec::new();
        }

        let prompt = build_prompt(window, active_memories);
        let raw = match self.llm.json_complete(&prompt, self.max_tokens).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "distiller: json_complete failed, returning empty delta");
                return Vec::new();
            }
        };

        match parse_delta(&raw) {
            Ok(delta) => delta,
            Err(e) => {
                warn!(error = %e, "distiller: unrecoverable parse failure, returning empty delta");
                Vec::new()
            }
        }
    }
}

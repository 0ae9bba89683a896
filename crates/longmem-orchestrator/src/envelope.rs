use serde::Serialize;

use longmem_core::types::MemoryType;

/// Per-turn result envelope returned by the orchestrator, serialized
/// field-for-field for any caller that wants it as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResult {
    pub response: String,
    pub turn_id: i64,
    /// Formatted as `"NN%"`, not a bare float — matches the external
    /// interface's wire shape.
    pub context_utilization: String,
    pub context_tokens: u32,
    pub retrieval_ms: f64,
    pub total_ms: f64,
    pub flush_triggered: bool,
    pub total_flushes: i64,
    pub total_memories: i64,
    pub active_memories: Vec<ActiveMemorySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveMemorySummary {
    pub memory_id: String,
    pub content: String,
    pub origin_turn: i64,
    pub last_used_turn: i64,
    #[serde(rename = "type")]
    pub mem_type: MemoryType,
    pub confidence: f64,
}

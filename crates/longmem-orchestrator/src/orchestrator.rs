use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use longmem_context::ContextManager;
use longmem_core::config::LongmemConfig;
use longmem_core::types::{Action, Memory, MemoryType, Role};
use longmem_distill::Distiller;
use longmem_embed::Embedder;
use longmem_llm::{ChatMessage, LlmClient};
use longmem_retrieve::Retriever;
use longmem_store::{MemoryStore, NewMemory, UpdateFields};

use crate::envelope::{ActiveMemorySummary, TurnResult};
use crate::error::{OrchestratorError, Result};

/// A preference memory needs at least this confidence before it's mirrored
/// into the profile projection. Matches the confidence floor used to trigger
/// `expire` on the low-confidence end — the profile is the high-confidence
/// complement of that same scale.
const PROFILE_CONFIDENCE_FLOOR: f64 = 0.5;

const SYSTEM_PROMPT_TEMPLATE: &str =
    "You are a conversational assistant with long-term memory of this conversation. \
     Use the facts and preferences below when they are relevant; don't mention that \
     you're consulting a memory system.";

/// Owns per-turn control flow: retrieve, inject, chat, log, maybe-flush.
/// Single-threaded, single-conversation — no locking around `turn`/`flush`
/// beyond what the store itself provides.
pub struct Orchestrator {
    store: MemoryStore,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LlmClient>,
    context: ContextManager,
    rrf_k: u32,
    top_k: usize,
    keep_tail_n: usize,
    distill_max_tokens: u32,
    current_turn_id: i64,
    segment_start_turn: i64,
    total_flushes: i64,
}

impl Orchestrator {
    /// Opens the store, recovers `current_turn_id` from `last_turn_id()`,
    /// and rebuilds the system prompt from the profile snapshot (no query
    /// yet — this only runs once, at startup).
    pub fn new(config: &LongmemConfig, embedder: Arc<dyn Embedder>, llm: Arc<dyn LlmClient>) -> Result<Self> {
        let store = MemoryStore::open(&config.db_path, config.embedding_dim)?;
        let current_turn_id = store.last_turn_id()?;
        let segment_start_turn = current_turn_id + 1;

        let mut context = ContextManager::new(config.context_limit, config.flush_threshold, config.keep_tail_n);
        let profile = store.profile_snapshot()?;
        context.set_system_prompt(render_system_prompt(&profile, &[]));

        info!(
            current_turn_id,
            segment_start_turn, "orchestrator: recovered state from store"
        );

        Ok(Self {
            store,
            embedder,
            llm,
            context,
            rrf_k: config.rrf_k,
            top_k: config.top_k,
            keep_tail_n: config.keep_tail_n,
            distill_max_tokens: config.distill_max_tokens,
            current_turn_id,
            segment_start_turn,
            total_flushes: 0,
        })
    }

    pub fn current_turn_id(&self) -> i64 {
        self.current_turn_id
    }

    pub fn total_flushes(&self) -> i64 {
        self.total_flushes
    }

    /// Runs one turn: retrieve, inject into the system prompt, append the
    /// user message, call the model, log both sides of the exchange, then
    /// flush if the context is over threshold.
    pub async fn turn(&mut self, message: &str) -> Result<TurnResult> {
        let turn_start = Instant::now();
        // The user-message row hasn't been logged yet — `log_turn` assigns
        // its id when it's actually inserted — so this is a prediction of
        // that id, not the id itself. Safe because the orchestrator
        // serializes all per-turn work: nothing else can log a row between
        // this read and the insert below.
        let pending_turn_id = self.store.last_turn_id()? + 1;

        let retrieval_start = Instant::now();
        let retriever = Retriever::new(&self.store, self.embedder.as_ref(), self.rrf_k);
        let results = retriever.retrieve(message, self.top_k, pending_turn_id)?;
        let retrieval_ms = retrieval_start.elapsed().as_secs_f64() * 1000.0;

        let profile = self.store.profile_snapshot()?;
        self.context
            .set_system_prompt(render_system_prompt(&profile, &results));
        self.context.append(Role::User, message);

        let chat_messages: Vec<ChatMessage> = self
            .context
            .messages_for_api()
            .into_iter()
            .map(|(role, content)| ChatMessage {
                role: to_llm_role(role),
                content,
            })
            .collect();
        let reply = self.llm.chat(&chat_messages).await?;
        self.context.append(Role::Assistant, reply.clone());

        let now = now_secs();
        let retrieved_ids: Vec<String> = results.iter().map(|r| r.memory.id.clone()).collect();
        let user_turn_id = self.store.log_turn(Role::User, message, now, &retrieved_ids)?;
        let assistant_turn_id = self.store.log_turn(Role::Assistant, &reply, now, &[])?;
        self.current_turn_id = assistant_turn_id;

        let mut flush_triggered = false;
        if self.context.needs_flush() {
            self.flush().await?;
            flush_triggered = true;
        }

        let total_memories = self.store.active_count()?;
        let active_memories = self.active_memory_summaries()?;
        let total_ms = turn_start.elapsed().as_secs_f64() * 1000.0;

        Ok(TurnResult {
            response: reply,
            turn_id: user_turn_id,
            context_utilization: format!("{:.0}%", self.context.utilization() * 100.0),
            context_tokens: self.context.total_tokens(),
            retrieval_ms,
            total_ms,
            flush_triggered,
            total_flushes: self.total_flushes,
            total_memories,
            active_memories,
        })
    }

    /// Identical to the threshold-triggered path, invoked by the caller
    /// instead of `turn()`'s internal `needs_flush()` check.
    pub async fn manual_flush(&mut self) -> Result<()> {
        self.flush().await
    }

    /// Distill the current window, apply the delta, and reset the context
    /// to its tail. A no-op with an empty delta when
    /// `segment_start_turn > current_turn_id` (nothing has happened since
    /// the last flush).
    async fn flush(&mut self) -> Result<()> {
        if self.segment_start_turn > self.current_turn_id {
            return Ok(());
        }

        let window = self.store.get_turn_range(self.segment_start_turn, self.current_turn_id)?;
        let active = self.store.get_active()?;
        let distiller = Distiller::new(self.llm.as_ref(), self.distill_max_tokens);
        let delta = distiller.distill(&window, &active).await;

        self.apply_delta(delta)?;

        self.context.reset(self.keep_tail_n)?;
        self.segment_start_turn = self.current_turn_id + 1;
        self.total_flushes += 1;
        info!(total_flushes = self.total_flushes, "orchestrator: flush complete");
        Ok(())
    }

    /// Applies a distillation delta as a single logical step. Non-add
    /// actions run first so that any explicit `expire`/`update` targeting a
    /// key takes effect before the add pass checks for collisions — this
    /// keeps the duplicate-key coalescing rule from racing against actions
    /// in the same delta.
    fn apply_delta(&mut self, delta: Vec<longmem_core::types::DistilledMemory>) -> Result<()> {
        let now = now_secs();
        let explicitly_targeted: HashSet<String> = delta
            .iter()
            .filter(|d| matches!(d.action, Action::Update | Action::Expire))
            .filter_map(|d| d.id.clone())
            .collect();

        let (adds, rest): (Vec<_>, Vec<_>) = delta.into_iter().partition(|d| d.action == Action::Add);

        for d in rest {
            match d.action {
                Action::Keep => {}
                Action::Expire => {
                    if let Some(id) = &d.id {
                        if let Some(mem) = self.store.get_by_id(id)? {
                            self.store.expire(id)?;
                            // A profiled preference whose backing memory just
                            // went inactive must not keep injecting its stale
                            // value into every future system prompt.
                            if mem.mem_type == MemoryType::Preference {
                                self.store.profile_delete(&mem.key)?;
                            }
                        }
                        info!(id = %id, "orchestrator: memory expired by distiller");
                    }
                }
                Action::Update => {
                    if let Some(id) = &d.id {
                        let new_embedding = match &d.value {
                            Some(new_value) => {
                                let key = self.store.get_by_id(id)?.map(|m| m.key).unwrap_or_default();
                                Some(self.embedder.embed(&format!("{key} {new_value}"))?)
                            }
                            None => None,
                        };
                        self.store.update(
                            id,
                            UpdateFields {
                                value: d.value.clone(),
                                confidence: d.confidence,
                            },
                            new_embedding.as_deref(),
                            now,
                        )?;
                        self.sync_profile_if_preference(id)?;
                    }
                }
                Action::Add => unreachable!("adds were partitioned out above"),
            }
        }

        for d in adds {
            self.apply_add(d, &explicitly_targeted, now)?;
        }
        Ok(())
    }

    fn apply_add(&mut self, d: longmem_core::types::DistilledMemory, explicitly_targeted: &HashSet<String>, now: f64) -> Result<()> {
        let key = d.key.unwrap_or_default();
        let mem_type = d.mem_type.unwrap_or(MemoryType::Fact);
        let value = d.value.unwrap_or_default();
        let confidence = d.confidence.unwrap_or_else(Memory::default_confidence);
        let mut source_turn = d.source_turn.unwrap_or(self.segment_start_turn);

        if let Some(existing) = self.store.get_active()?.into_iter().find(|m| m.key == key) {
            if !explicitly_targeted.contains(&existing.id) {
                warn!(
                    key = %key,
                    old_id = %existing.id,
                    "orchestrator: coalescing add into implicit update for duplicate active key"
                );
            }
            source_turn = source_turn.min(existing.source_turn);
            self.store.expire(&existing.id)?;
        }

        let embedding = self.embedder.embed(&format!("{key} {value}"))?;
        let id = self.store.add(
            NewMemory {
                mem_type,
                category: d.category.unwrap_or_default(),
                key: key.clone(),
                value: value.clone(),
                confidence,
                source_turn,
                created_at: now,
            },
            &embedding,
        )?;

        if mem_type == MemoryType::Preference && confidence >= PROFILE_CONFIDENCE_FLOOR {
            self.store.profile_upsert(&key, &value, source_turn, now)?;
        }
        let _ = id;
        Ok(())
    }

    fn sync_profile_if_preference(&mut self, id: &str) -> Result<()> {
        if let Some(mem) = self.store.get_by_id(id)? {
            if mem.mem_type == MemoryType::Preference && mem.confidence >= PROFILE_CONFIDENCE_FLOOR {
                self.store
                    .profile_upsert(&mem.key, &mem.value, mem.source_turn, mem.updated_at)?;
            }
        }
        Ok(())
    }

    fn active_memory_summaries(&self) -> Result<Vec<ActiveMemorySummary>> {
        Ok(self
            .store
            .get_active()?
            .into_iter()
            .map(|m| ActiveMemorySummary {
                memory_id: m.id,
                content: format!("{}: {}", m.key, m.value),
                origin_turn: m.source_turn,
                last_used_turn: m.last_used_turn,
                mem_type: m.mem_type,
                confidence: m.confidence,
            })
            .collect())
    }
}

fn render_system_prompt(profile: &[longmem_core::types::ProfileEntry], results: &[longmem_core::types::RetrievalResult]) -> String {
    let mut out = SYSTEM_PROMPT_TEMPLATE.to_string();

    if !profile.is_empty() {
        out.push_str("\n\n## Known preferences\n");
        for p in profile {
            out.push_str(&format!("- {}: {}\n", p.key, p.value));
        }
    }

    if !results.is_empty() {
        out.push_str("\n\n## Relevant memories\n");
        for r in results {
            out.push_str(&format!("- [{}] {}: {}\n", r.memory.mem_type, r.memory.key, r.memory.value));
        }
    }

    out
}

fn to_llm_role(role: Role) -> longmem_llm::Role {
    match role {
        Role::User => longmem_llm::Role::User,
        Role::Assistant => longmem_llm::Role::Assistant,
        Role::System => longmem_llm::Role::System,
    }
}

fn now_secs() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
}

use longmem_core::tokenize::count_tokens;
use longmem_core::types::Role;
use tracing::debug;

use crate::error::{ContextError, Result};

#[derive(Debug, Clone)]
struct Message {
    role: Role,
    content: String,
    tokens: u32,
}

/// Token-accounted sliding window of chat messages plus a separately tracked
/// system prompt slot.
///
/// The system prompt is rebuilt wholesale on every turn (it carries the
/// profile + per-query memory sections) rather than appended to, so it lives
/// outside the message list proper.
pub struct ContextManager {
    limit: u32,
    flush_threshold: f64,
    default_keep_tail_n: usize,
    system_prompt: String,
    system_tokens: u32,
    messages: Vec<Message>,
}

impl ContextManager {
    pub fn new(limit: u32, flush_threshold: f64, default_keep_tail_n: usize) -> Self {
        Self {
            limit,
            flush_threshold,
            default_keep_tail_n,
            system_prompt: String::new(),
            system_tokens: 0,
            messages: Vec::new(),
        }
    }

    pub fn default_keep_tail_n(&self) -> usize {
        self.default_keep_tail_n
    }

    /// Replaces the system slot wholesale and updates the running total.
    pub fn set_system_prompt(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.system_tokens = count_tokens(&text);
        self.system_prompt = text;
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        let content = content.into();
        let tokens = count_tokens(&content);
        self.messages.push(Message {
            role,
            content,
            tokens,
        });
    }

    /// System prompt tokens plus every retained message's tokens. Never
    /// negative — every term is an unsigned token count.
    pub fn total_tokens(&self) -> u32 {
        self.system_tokens + self.messages.iter().map(|m| m.tokens).sum::<u32>()
    }

    pub fn utilization(&self) -> f64 {
        if self.limit == 0 {
            return 1.0;
        }
        self.total_tokens() as f64 / self.limit as f64
    }

    pub fn needs_flush(&self) -> bool {
        self.utilization() >= self.flush_threshold
    }

    /// Drops all non-system messages except the last `keep_tail_n`, then
    /// recomputes the total. Fails with `ConfigError` if the retained tail is
    /// still over threshold — the caller configured too large a tail for too
    /// small a threshold and flushing would never actually relieve pressure.
    pub fn reset(&mut self, keep_tail_n: usize) -> Result<()> {
        let tail_start = self.messages.len().saturating_sub(keep_tail_n);
        self.messages.drain(0..tail_start);

        let utilization = self.utilization();
        if utilization >= self.flush_threshold {
            return Err(ContextError::ConfigError {
                keep_tail_n,
                utilization,
                flush_threshold: self.flush_threshold,
            });
        }
        debug!(
            keep_tail_n,
            utilization, "context: reset to tail, now under threshold"
        );
        Ok(())
    }

    /// System prompt followed by retained messages, in order — exactly what
    /// `llm.chat` expects as its `messages` argument.
    pub fn messages_for_api(&self) -> Vec<(Role, String)> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        out.push((Role::System, self.system_prompt.clone()));
        for m in &self.messages {
            out.push((m.role, m.content.clone()));
        }
        out
    }
}

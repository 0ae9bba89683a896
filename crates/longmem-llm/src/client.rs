use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{LlmError, Result};

/// Role of one message in a chat request. Mirrors the roles the context
/// manager's `messages_for_api()` produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// The two capabilities the core consumes from an LLM, exactly as spec'd:
/// `chat(messages) -> assistant_text` and `json_complete(prompt) ->
/// structured_object`. Provider-specific JSON-mode hints live entirely
/// inside the implementation, never leak into the core.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Full conversational turn. Any `Role::System` entries are extracted and
    /// sent as the provider's dedicated system slot rather than as a message.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Requests up to `max_tokens` of JSON-ish text back from the model and
    /// returns it unparsed — truncation recovery and parsing are the
    /// distiller's job, not the transport's.
    async fn json_complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}

const API_VERSION: &str = "2023-06-01";

/// Talks to `/v1/messages`, trimmed to the two capabilities this core needs:
/// no streaming, no tool-calling, no multi-provider router. Those live in
/// full-featured agent runtimes, not this memory core.
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    async fn send(&self, system: &str, messages: Vec<serde_json::Value>, max_tokens: u32) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "system": system,
            "messages": messages,
            "stream": false,
        });

        debug!(model = %self.model, "longmem-llm: sending request to Anthropic");

        let resp = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status == 429 {
            let retry_after_ms = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(5000);
            return Err(LlmError::RateLimited { retry_after_ms });
        }
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "longmem-llm: Anthropic API error");
            return Err(LlmError::Api {
                status,
                message: text,
            });
        }

        let api_resp: ApiResponse = resp.json().await.map_err(|e| LlmError::Parse(e.to_string()))?;
        let text = api_resp
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Unknown => None,
            })
            .collect::<Vec<_>>()
            .join("");
        Ok(text)
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let system: String = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let turn_messages: Vec<serde_json::Value> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::System => unreachable!("system messages filtered above"),
                };
                serde_json::json!({ "role": role, "content": m.content })
            })
            .collect();

        self.send(&system, turn_messages, 1024).await
    }

    async fn json_complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let system = "Respond with a single JSON object only. No prose, no markdown code fences.";
        let messages = vec![serde_json::json!({ "role": "user", "content": prompt })];
        self.send(system, messages, max_tokens).await
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Unknown,
}

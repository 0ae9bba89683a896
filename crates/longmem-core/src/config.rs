use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONTEXT_LIMIT: u32 = 8192;
pub const DEFAULT_FLUSH_THRESHOLD: f64 = 0.70;
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_EMBEDDING_DIM: usize = 384;
pub const DEFAULT_RRF_K: u32 = 60;
pub const DEFAULT_DISTILL_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_KEEP_TAIL_N: usize = 4;

/// Top-level config (longmem.toml + LONGMEM_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LongmemConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_context_limit")]
    pub context_limit: u32,
    #[serde(default = "default_flush_threshold")]
    pub flush_threshold: f64,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
    #[serde(default = "default_rrf_k")]
    pub rrf_k: u32,
    #[serde(default = "default_distill_max_tokens")]
    pub distill_max_tokens: u32,
    #[serde(default = "default_keep_tail_n")]
    pub keep_tail_n: usize,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmConfig {
    pub anthropic: Option<AnthropicConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    pub api_key: String,
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,
    #[serde(default = "default_anthropic_model")]
    pub model: String,
}

impl Default for LongmemConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            context_limit: default_context_limit(),
            flush_threshold: default_flush_threshold(),
            top_k: default_top_k(),
            embedding_dim: default_embedding_dim(),
            rrf_k: default_rrf_k(),
            distill_max_tokens: default_distill_max_tokens(),
            keep_tail_n: default_keep_tail_n(),
            llm: LlmConfig::default(),
        }
    }
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.longmem/longmem.db")
}
fn default_context_limit() -> u32 {
    DEFAULT_CONTEXT_LIMIT
}
fn default_flush_threshold() -> f64 {
    DEFAULT_FLUSH_THRESHOLD
}
fn default_top_k() -> usize {
    DEFAULT_TOP_K
}
fn default_embedding_dim() -> usize {
    DEFAULT_EMBEDDING_DIM
}
fn default_rrf_k() -> u32 {
    DEFAULT_RRF_K
}
fn default_distill_max_tokens() -> u32 {
    DEFAULT_DISTILL_MAX_TOKENS
}
fn default_keep_tail_n() -> usize {
    DEFAULT_KEEP_TAIL_N
}
fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}
fn default_anthropic_model() -> String {
    "claude-haiku-4-5-20251001".to_string()
}

impl LongmemConfig {
    /// Load config from a TOML file with LONGMEM_* env var overrides.
    ///
    /// Checks in order: explicit path argument, then `~/.longmem/longmem.toml`.
    /// Missing file is not an error — figment simply contributes no values and
    /// the `#[serde(default = ...)]` fields fill in.
    pub fn load(config_path: Option<&str>) -> crate::error::CoreResult<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: LongmemConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("LONGMEM_").split("_"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.longmem/longmem.toml")
}

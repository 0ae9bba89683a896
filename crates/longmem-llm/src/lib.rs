pub mod client;
pub mod error;

pub use client::{AnthropicClient, ChatMessage, LlmClient, Role};
pub use error::{LlmError, Result};

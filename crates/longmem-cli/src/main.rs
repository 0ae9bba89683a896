use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing::{info, warn};

use longmem_core::config::LongmemConfig;
use longmem_embed::{Embedder, HashingEmbedder};
use longmem_llm::{AnthropicClient, LlmClient};
use longmem_orchestrator::Orchestrator;

/// Minimal stdin/stdout chat loop proving the pipeline runs end to end.
/// Deliberately thin — no rendering or input UX beyond a raw prompt; just
/// enough to drive `Orchestrator::turn` from a terminal.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "longmem_cli=info".into()),
        )
        .init();

    let config_path = std::env::var("LONGMEM_CONFIG").ok();
    let config = LongmemConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("config load failed ({e}), using defaults");
        LongmemConfig::default()
    });

    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(config.embedding_dim));

    let Some(anthropic) = config.llm.anthropic.clone() else {
        anyhow::bail!(
            "no [llm.anthropic] section configured (set api_key in {} or LONGMEM_LLM_ANTHROPIC_API_KEY)",
            config_path.as_deref().unwrap_or("~/.longmem/longmem.toml")
        );
    };
    let llm: Arc<dyn LlmClient> = Arc::new(AnthropicClient::new(
        anthropic.api_key,
        anthropic.base_url,
        anthropic.model,
    ));

    let mut orchestrator = Orchestrator::new(&config, embedder, llm)?;
    info!(db_path = %config.db_path, "longmem: ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        print!("> ");
        stdout.flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/quit" {
            break;
        }
        if input == "/flush" {
            orchestrator.manual_flush().await?;
            println!("(memory flushed)");
            continue;
        }

        let result = orchestrator.turn(input).await?;
        println!("{}", result.response);
        println!(
            "  [turn {} | context {} ({} tok) | retrieval {:.1}ms | total {:.1}ms{}]",
            result.turn_id,
            result.context_utilization,
            result.context_tokens,
            result.retrieval_ms,
            result.total_ms,
            if result.flush_triggered { " | flushed" } else { "" },
        );
    }

    Ok(())
}

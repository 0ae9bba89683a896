use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::{debug, warn};

use longmem_core::types::RetrievalResult;
use longmem_embed::{EmbedCache, Embedder};
use longmem_store::MemoryStore;

use crate::error::Result;

/// Hybrid vector + lexical retriever fusing both rankings with Reciprocal
/// Rank Fusion. Does not own the store or embedder — both outlive it and are
/// shared with the rest of the per-turn pipeline.
pub struct Retriever<'a> {
    store: &'a MemoryStore,
    embedder: &'a dyn Embedder,
    rrf_k: u32,
}

impl<'a> Retriever<'a> {
    pub fn new(store: &'a MemoryStore, embedder: &'a dyn Embedder, rrf_k: u32) -> Self {
        Self {
            store,
            embedder,
            rrf_k,
        }
    }

    /// Runs hybrid retrieval for `query`, returning at most `top_k` results
    /// ordered by fused score descending. Touches every returned memory's
    /// `last_used_turn` synchronously before returning, so the caller's next
    /// step observes the update.
    pub fn retrieve(&self, query: &str, top_k: usize, current_turn_id: i64) -> Result<Vec<RetrievalResult>> {
        let overfetch = top_k.saturating_mul(3);
        let embed_cache = EmbedCache::new(self.embedder);

        let vector_hits = match embed_cache.embed(query) {
            Ok(qv) => self.store.search_vector(&qv, overfetch)?,
            Err(e) => {
                warn!(error = %e, "retriever: embedding unavailable, degrading to FTS-only");
                Vec::new()
            }
        };
        let fts_hits = self.store.search_fts(query, overfetch)?;

        if vector_hits.is_empty() && fts_hits.is_empty() {
            return Ok(Vec::new());
        }

        let mut scores: HashMap<String, f64> = HashMap::new();
        let mut vector_rank: HashMap<String, usize> = HashMap::new();
        let mut fts_rank: HashMap<String, usize> = HashMap::new();

        for (rank, (id, _distance)) in vector_hits.iter().enumerate() {
            *scores.entry(id.clone()).or_insert(0.0) += 1.0 / (self.rrf_k as f64 + rank as f64);
            vector_rank.insert(id.clone(), rank);
        }
        for (rank, (id, _bm25)) in fts_hits.iter().enumerate() {
            *scores.entry(id.clone()).or_insert(0.0) += 1.0 / (self.rrf_k as f64 + rank as f64);
            fts_rank.insert(id.clone(), rank);
        }

        let mut ids: Vec<String> = scores.keys().cloned().collect();
        ids.sort_by(|a, b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(Ordering::Equal)
                .then_with(|| rank_cmp(vector_rank.get(a), vector_rank.get(b)))
                .then_with(|| rank_cmp(fts_rank.get(a), fts_rank.get(b)))
                .then_with(|| a.cmp(b))
        });
        ids.truncate(top_k);

        let mut results = Vec::with_capacity(ids.len());
        for id in &ids {
            self.store.touch(id, current_turn_id)?;
            if let Some(memory) = self.store.get_by_id(id)? {
                results.push(RetrievalResult {
                    score: scores[id],
                    vector_rank: vector_rank.get(id).copied(),
                    fts_rank: fts_rank.get(id).copied(),
                    memory,
                });
            }
        }
        debug!(query, hits = results.len(), "retriever: hybrid search complete");
        Ok(results)
    }
}

fn rank_cmp(a: Option<&usize>, b: Option<&usize>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

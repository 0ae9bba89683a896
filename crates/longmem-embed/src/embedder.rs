use std::cell::RefCell;
use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::error::{EmbeddingError, Result};

/// A pure function `text -> vector<f32, D>`. Deterministic for a given
/// implementation and dimension; no network or disk access is implied.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Deterministic feature-hashed bag-of-tokens embedder. No model weights, no
/// external calls — every token is hashed into one of `dim` signed buckets
/// and the result is L2-normalized. Good enough to make the vector index
/// meaningfully cluster similar short facts without pulling in an ML runtime.
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Embedder for HashingEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.dim == 0 {
            return Err(EmbeddingError::Unavailable(
                "embedding dimension must be nonzero".to_string(),
            ));
        }
        let mut v = vec![0f32; self.dim];
        for token in longmem_core::tokenize::tokens(&text.to_lowercase()) {
            let digest = Sha256::digest(token.as_bytes());
            let bucket_bytes: [u8; 8] = digest[0..8].try_into().unwrap();
            let bucket = u64::from_le_bytes(bucket_bytes) as usize % self.dim;
            let sign = if digest[8] & 1 == 1 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in v.iter_mut() {
                *x /= norm;
            }
        }
        Ok(v)
    }
}

/// Memoizes `embed` calls by input text for the lifetime of one retrieval or
/// distillation pass, so a query or memory text embedded more than once in
/// the same call doesn't recompute the hash-and-normalize work.
pub struct EmbedCache<'a> {
    inner: &'a dyn Embedder,
    cache: RefCell<HashMap<String, Vec<f32>>>,
}

impl<'a> EmbedCache<'a> {
    pub fn new(inner: &'a dyn Embedder) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(v) = self.cache.borrow().get(text) {
            return Ok(v.clone());
        }
        let v = self.inner.embed(text)?;
        self.cache.borrow_mut().insert(text.to_string(), v.clone());
        Ok(v)
    }
}

//! Embedding services that need no model.

use async_trait::async_trait;
use toonctx_core::error::HostError;
use toonctx_core::host::EmbeddingService;

/// Dimensions produced by [`HashingEmbedder::default`].
pub const DEFAULT_DIMENSIONS: usize = 64;

/// Bag-of-words embedder: each lowercase word is hashed into one of
/// `dimensions` buckets and the result is L2-normalized.
///
/// Deterministic across runs, so texts sharing words land close together.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

/// 64-bit FNV-1a.
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

#[async_trait]
impl EmbeddingService for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, HostError> {
        if text.trim().is_empty() {
            return Err(HostError::Embedding("empty input text".into()));
        }

        let mut vector = vec![0.0f32; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = fnv1a(word.to_lowercase().as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }
}

/// Returns the same vector for every non-empty text.
#[derive(Debug, Clone)]
pub struct FixedEmbedder {
    vector: Vec<f32>,
}

impl FixedEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector }
    }
}

#[async_trait]
impl EmbeddingService for FixedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, HostError> {
        if text.trim().is_empty() {
            return Err(HostError::Embedding("empty input text".into()));
        }
        Ok(self.vector.clone())
    }
}

/// Always fails, standing in for an unreachable embedding model.
#[derive(Debug, Clone, Default)]
pub struct UnavailableEmbedder;

#[async_trait]
impl EmbeddingService for UnavailableEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, HostError> {
        Err(HostError::Embedding("embedding service unavailable".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::cosine_similarity;

    #[tokio::test]
    async fn hashing_is_deterministic_and_normalized() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("Rust makes systems programming fun").await.unwrap();
        let b = embedder.embed("Rust makes systems programming fun").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_DIMENSIONS);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn shared_words_are_closer() {
        let embedder = HashingEmbedder::new(256);
        let query = embedder.embed("favourite tea flavour").await.unwrap();
        let related = embedder.embed("Alice likes green tea, her favourite flavour").await.unwrap();
        let unrelated = embedder.embed("deploy the kubernetes cluster").await.unwrap();
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let err = HashingEmbedder::default().embed("   ").await.unwrap_err();
        assert!(matches!(err, HostError::Embedding(_)));
        assert!(FixedEmbedder::new(vec![1.0]).embed("").await.is_err());
    }

    #[tokio::test]
    async fn unavailable_embedder_always_fails() {
        assert!(UnavailableEmbedder.embed("anything at all").await.is_err());
    }
}

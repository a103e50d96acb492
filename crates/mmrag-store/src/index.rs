//! In-memory embedding index.
//!
//! [`MemoryEmbeddingIndex`] embeds each entry's key through an injected
//! [`Embedder`] and ranks entries by brute-force cosine distance. The
//! identifier is stored next to the vector and is never embedded.
//!
//! Two ranking modes are supported:
//!
//! - [`SearchMode::Similarity`]: the `k` nearest keys, ascending distance.
//! - [`SearchMode::Diverse`]: maximal marginal relevance over the `fetch_k`
//!   nearest keys. Every hit carries [`SearchMode::SENTINEL_SCORE`].

use async_trait::async_trait;
use mmrag_core::{
    EmbedError, Embedder, EmbeddingConfig, EmbeddingIndex, Error, Identifier, IndexEntry,
    IndexHit, SearchMode, StoreError,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Default number of candidates considered by diverse search.
pub const DEFAULT_FETCH_K: usize = 20;

/// Default trade-off between relevance (1.0) and diversity (0.0).
pub const DEFAULT_LAMBDA_MULT: f32 = 0.5;

/// Diverse-search parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiversityConfig {
    /// Number of nearest candidates MMR picks from
    pub fetch_k: usize,
    /// Weight of query relevance against redundancy, in `[0, 1]`
    pub lambda_mult: f32,
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            fetch_k: DEFAULT_FETCH_K,
            lambda_mult: DEFAULT_LAMBDA_MULT,
        }
    }
}

impl DiversityConfig {
    /// Check that the parameters are usable.
    pub fn validate(&self) -> Result<(), Error> {
        if self.fetch_k == 0 {
            return Err(Error::Config("fetch_k must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.lambda_mult) {
            return Err(Error::Config(format!(
                "lambda_mult must be within [0, 1], got {}",
                self.lambda_mult
            )));
        }
        Ok(())
    }
}

struct IndexedVector {
    id: Identifier,
    vector: Vec<f32>,
}

/// Brute-force vector index kept in memory.
pub struct MemoryEmbeddingIndex {
    embedder: Arc<dyn Embedder>,
    embedding_config: EmbeddingConfig,
    diversity: DiversityConfig,
    vectors: RwLock<Vec<IndexedVector>>,
}

impl MemoryEmbeddingIndex {
    /// Create an index with default diversity parameters.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            embedding_config: EmbeddingConfig::default(),
            diversity: DiversityConfig::default(),
            vectors: RwLock::new(Vec::new()),
        }
    }

    /// Create an index with explicit diversity parameters.
    pub fn with_diversity(
        embedder: Arc<dyn Embedder>,
        diversity: DiversityConfig,
    ) -> Result<Self, Error> {
        diversity.validate()?;
        Ok(Self {
            diversity,
            ..Self::new(embedder)
        })
    }

    /// Override the embedding configuration used for keys and queries.
    #[must_use]
    pub fn with_embedding_config(mut self, config: EmbeddingConfig) -> Self {
        self.embedding_config = config;
        self
    }

    /// Name of the embedding model backing this index.
    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    async fn embed_keys(&self, keys: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let batch_size = self.embedding_config.batch_size.max(1);
        let mut vectors = Vec::with_capacity(keys.len());
        for batch in keys.chunks(batch_size) {
            let outputs = self
                .embedder
                .embed_text(batch, &self.embedding_config)
                .await?;
            if outputs.len() != batch.len() {
                return Err(EmbedError::Inference(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    outputs.len()
                )));
            }
            vectors.extend(outputs.into_iter().map(|o| o.embedding));
        }
        Ok(vectors)
    }

    fn rank_similarity(query: &[f32], vectors: &[IndexedVector], k: usize) -> Vec<IndexHit> {
        let mut scored: Vec<IndexHit> = vectors
            .iter()
            .map(|v| IndexHit {
                id: v.id,
                score: cosine_distance(query, &v.vector),
            })
            .collect();
        // Stable sort keeps insertion order among equal distances.
        scored.sort_by(|a, b| a.score.total_cmp(&b.score));
        scored.truncate(k);
        scored
    }

    fn rank_diverse(&self, query: &[f32], vectors: &[IndexedVector], k: usize) -> Vec<IndexHit> {
        let fetch_k = self.diversity.fetch_k.max(k);
        let mut candidates: Vec<(usize, f32)> = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(query, &v.vector)))
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        candidates.truncate(fetch_k);

        let lambda = self.diversity.lambda_mult;
        let mut selected: Vec<usize> = Vec::with_capacity(k);
        while selected.len() < k && !candidates.is_empty() {
            let mut best_pos = 0;
            let mut best_score = f32::NEG_INFINITY;
            for (pos, &(idx, relevance)) in candidates.iter().enumerate() {
                let redundancy = selected
                    .iter()
                    .map(|&s| cosine_similarity(&vectors[idx].vector, &vectors[s].vector))
                    .fold(f32::NEG_INFINITY, f32::max);
                let redundancy = if redundancy.is_finite() { redundancy } else { 0.0 };
                let score = lambda * relevance - (1.0 - lambda) * redundancy;
                if score > best_score {
                    best_score = score;
                    best_pos = pos;
                }
            }
            let (idx, _) = candidates.remove(best_pos);
            selected.push(idx);
        }

        selected
            .into_iter()
            .map(|idx| IndexHit {
                id: vectors[idx].id,
                score: SearchMode::SENTINEL_SCORE,
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingIndex for MemoryEmbeddingIndex {
    async fn add(&self, entries: Vec<IndexEntry>) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }

        let keys: Vec<&str> = entries.iter().map(|e| e.embedding_key.as_str()).collect();
        let vectors = self.embed_keys(&keys).await?;

        let mut stored = self.vectors.write().await;
        stored.extend(
            entries
                .iter()
                .zip(vectors)
                .map(|(entry, vector)| IndexedVector {
                    id: entry.id,
                    vector,
                }),
        );
        debug!(
            "Indexed {} keys with {} ({} total)",
            entries.len(),
            self.embedder.model_name(),
            stored.len()
        );
        Ok(())
    }

    async fn query(
        &self,
        text: &str,
        k: usize,
        mode: SearchMode,
    ) -> Result<Vec<IndexHit>, StoreError> {
        if k == 0 || self.vectors.read().await.is_empty() {
            return Ok(Vec::new());
        }

        let query = self
            .embedder
            .embed_query(text, &self.embedding_config)
            .await?;

        let vectors = self.vectors.read().await;
        let hits = match mode {
            SearchMode::Similarity => Self::rank_similarity(&query.embedding, &vectors, k),
            SearchMode::Diverse => self.rank_diverse(&query.embedding, &vectors, k),
        };
        debug!(
            "Query ranked {} of {} entries ({:?})",
            hits.len(),
            vectors.len(),
            mode
        );
        Ok(hits)
    }

    async fn len(&self) -> usize {
        self.vectors.read().await.len()
    }
}

/// Cosine similarity; zero-length, zero-norm or mismatched vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Cosine distance, `1 - cosine_similarity`. Zero vectors sit at distance 1.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmrag_core::EmbeddingOutput;
    use mmrag_embed::HashingEmbedder;

    /// Maps each text to a fixed vector by keyword.
    struct AxisEmbedder;

    #[async_trait]
    impl Embedder for AxisEmbedder {
        fn model_name(&self) -> &str {
            "axis"
        }

        fn dimension(&self) -> usize {
            3
        }

        async fn embed_text(
            &self,
            texts: &[&str],
            _config: &EmbeddingConfig,
        ) -> Result<Vec<EmbeddingOutput>, EmbedError> {
            Ok(texts
                .iter()
                .map(|t| {
                    let embedding = match *t {
                        "x" => vec![1.0, 0.0, 0.0],
                        "x2" => vec![0.99, 0.1, 0.0],
                        "xy" => vec![0.7, 0.7, 0.0],
                        "y" => vec![0.0, 1.0, 0.0],
                        "z" => vec![0.0, 0.0, 1.0],
                        _ => vec![0.0, 0.0, 0.0],
                    };
                    EmbeddingOutput {
                        embedding,
                        token_count: 1,
                    }
                })
                .collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing"
        }

        fn dimension(&self) -> usize {
            3
        }

        async fn embed_text(
            &self,
            _texts: &[&str],
            _config: &EmbeddingConfig,
        ) -> Result<Vec<EmbeddingOutput>, EmbedError> {
            Err(EmbedError::BackendUnavailable("offline".to_string()))
        }
    }

    fn entry(key: &str) -> IndexEntry {
        IndexEntry {
            embedding_key: key.to_string(),
            id: Identifier::new(),
        }
    }

    // ==================== Similarity ====================

    #[tokio::test]
    async fn test_empty_index_returns_no_hits() {
        let index = MemoryEmbeddingIndex::new(Arc::new(AxisEmbedder));
        let hits = index.query("x", 3, SearchMode::Similarity).await.unwrap();
        assert!(hits.is_empty());
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn test_similarity_orders_by_distance() {
        let index = MemoryEmbeddingIndex::new(Arc::new(AxisEmbedder));
        let y = entry("y");
        let x = entry("x");
        let xy = entry("xy");
        index
            .add(vec![y.clone(), x.clone(), xy.clone()])
            .await
            .unwrap();

        let hits = index.query("x", 3, SearchMode::Similarity).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![x.id, xy.id, y.id]);
        assert!(hits[0].score.abs() < 1e-6);
        assert!((hits[2].score - 1.0).abs() < 1e-6);
        assert!(hits.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[tokio::test]
    async fn test_similarity_truncates_to_k() {
        let index = MemoryEmbeddingIndex::new(Arc::new(AxisEmbedder));
        index
            .add(vec![entry("x"), entry("y"), entry("z"), entry("xy")])
            .await
            .unwrap();

        let hits = index.query("x", 2, SearchMode::Similarity).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(index.query("x", 0, SearchMode::Similarity).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let index = MemoryEmbeddingIndex::new(Arc::new(AxisEmbedder));
        let first = entry("y");
        let second = entry("z");
        index
            .add(vec![first.clone(), second.clone()])
            .await
            .unwrap();

        let hits = index.query("x", 2, SearchMode::Similarity).await.unwrap();
        assert_eq!(hits[0].id, first.id);
        assert_eq!(hits[1].id, second.id);
    }

    #[tokio::test]
    async fn test_zero_vector_distance_is_one() {
        let index = MemoryEmbeddingIndex::new(Arc::new(AxisEmbedder));
        index.add(vec![entry("unknown")]).await.unwrap();

        let hits = index.query("x", 1, SearchMode::Similarity).await.unwrap();
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_duplicate_keys_are_separate_entries() {
        let index = MemoryEmbeddingIndex::new(Arc::new(AxisEmbedder));
        let a = entry("x");
        let b = entry("x");
        index.add(vec![a.clone(), b.clone()]).await.unwrap();

        let hits = index.query("x", 5, SearchMode::Similarity).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_ne!(hits[0].id, hits[1].id);
    }

    #[tokio::test]
    async fn test_hashing_embedder_prefers_lexical_overlap() {
        let index = MemoryEmbeddingIndex::new(Arc::new(HashingEmbedder::default()));
        let cats = entry("Cats are small domesticated mammals");
        let stocks = entry("The stock market fell sharply on Monday");
        index
            .add(vec![stocks.clone(), cats.clone()])
            .await
            .unwrap();

        let hits = index
            .query("domesticated cats", 2, SearchMode::Similarity)
            .await
            .unwrap();
        assert_eq!(hits[0].id, cats.id);
    }

    // ==================== Diverse ====================

    #[tokio::test]
    async fn test_diverse_scores_are_sentinel() {
        let index = MemoryEmbeddingIndex::new(Arc::new(AxisEmbedder));
        index
            .add(vec![entry("x"), entry("x2"), entry("y")])
            .await
            .unwrap();

        let hits = index.query("x", 3, SearchMode::Diverse).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.score == SearchMode::SENTINEL_SCORE));
    }

    #[tokio::test]
    async fn test_diverse_skips_near_duplicates() {
        let index = MemoryEmbeddingIndex::new(Arc::new(AxisEmbedder));
        let x = entry("x");
        let x2 = entry("x2");
        let xy = entry("xy");
        index
            .add(vec![x.clone(), x2.clone(), xy.clone()])
            .await
            .unwrap();

        // With a strong diversity weight the near-duplicate x2 loses to xy.
        let diverse = MemoryEmbeddingIndex::with_diversity(
            Arc::new(AxisEmbedder),
            DiversityConfig {
                fetch_k: 20,
                lambda_mult: 0.3,
            },
        )
        .unwrap();
        diverse
            .add(vec![x.clone(), x2.clone(), xy.clone()])
            .await
            .unwrap();

        let similar = index.query("x", 2, SearchMode::Similarity).await.unwrap();
        assert_eq!(similar[1].id, x2.id);

        let hits = diverse.query("x", 2, SearchMode::Diverse).await.unwrap();
        assert_eq!(hits[0].id, x.id);
        assert_eq!(hits[1].id, xy.id);
    }

    #[test]
    fn test_diversity_config_validation() {
        assert!(DiversityConfig::default().validate().is_ok());
        assert!(DiversityConfig {
            fetch_k: 0,
            lambda_mult: 0.5
        }
        .validate()
        .is_err());
        assert!(DiversityConfig {
            fetch_k: 5,
            lambda_mult: 1.5
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_with_diversity_rejects_invalid() {
        let result = MemoryEmbeddingIndex::with_diversity(
            Arc::new(AxisEmbedder),
            DiversityConfig {
                fetch_k: 0,
                lambda_mult: 0.5,
            },
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    // ==================== Errors ====================

    #[tokio::test]
    async fn test_add_propagates_embedding_error() {
        let index = MemoryEmbeddingIndex::new(Arc::new(FailingEmbedder));
        let err = index.add(vec![entry("x")]).await.unwrap_err();
        assert!(matches!(err, StoreError::Embedding(_)));
        assert_eq!(index.len().await, 0);
    }

    #[tokio::test]
    async fn test_add_empty_is_noop() {
        let index = MemoryEmbeddingIndex::new(Arc::new(FailingEmbedder));
        index.add(Vec::new()).await.unwrap();
    }

    // ==================== Cosine ====================

    #[test]
    fn test_cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_distance_opposite_vectors() {
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
    }
}

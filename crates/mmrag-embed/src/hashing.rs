//! Deterministic feature-hashing embedder.
//!
//! [`HashingEmbedder`] needs no model download, so it is what the CLI uses by
//! default and what tests use when they want real lexical overlap instead of
//! hand-picked vectors. Texts sharing (stemmed, non-stopword) terms land close
//! together; unrelated texts land near distance 1.

use async_trait::async_trait;
use mmrag_core::{EmbedError, Embedder, EmbeddingConfig, EmbeddingOutput};
use tracing::trace;

/// Default embedding dimension, matching gte-small.
pub const DEFAULT_DIMENSION: usize = 384;

const STOPWORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "as", "at", "be", "been", "but", "by", "can", "do", "does",
    "for", "from", "has", "have", "how", "in", "into", "is", "it", "its", "of", "on", "or",
    "that", "the", "their", "them", "there", "these", "they", "this", "those", "to", "was",
    "were", "what", "when", "where", "which", "who", "why", "will", "with",
];

/// Embedder that hashes terms into a fixed number of signed buckets.
///
/// # Example
///
/// ```rust
/// use mmrag_embed::HashingEmbedder;
/// use mmrag_core::{Embedder, EmbeddingConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let embedder = HashingEmbedder::default();
/// let outputs = embedder
///     .embed_text(&["Cats are mammals"], &EmbeddingConfig::default())
///     .await?;
///
/// assert_eq!(outputs[0].embedding.len(), 384);
/// assert_eq!(outputs[0].token_count, 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create a hashing embedder with `dimension` buckets.
    pub fn new(dimension: usize) -> Result<Self, EmbedError> {
        if dimension == 0 {
            return Err(EmbedError::ModelLoad(
                "embedding dimension must be at least 1".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    /// Split text into normalized terms.
    pub fn terms(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .filter(|t| !STOPWORDS.contains(&t.as_str()))
            .map(|t| stem(&t))
            .collect()
    }

    fn embed_one(&self, text: &str, normalize: bool) -> EmbeddingOutput {
        let terms = Self::terms(text);
        let mut embedding = vec![0.0f32; self.dimension];

        for term in &terms {
            let hash = blake3::hash(term.as_bytes());
            let bytes = hash.as_bytes();
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&bytes[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }

        if normalize {
            let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > 0.0 {
                for v in &mut embedding {
                    *v /= norm;
                }
            }
        }

        EmbeddingOutput {
            embedding,
            token_count: terms.len(),
        }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }
}

/// Strip common English plural suffixes.
fn stem(term: &str) -> String {
    if term.len() > 4 && term.ends_with("ies") {
        return format!("{}y", &term[..term.len() - 3]);
    }
    if term.len() > 3 && term.ends_with('s') && !term.ends_with("ss") && !term.ends_with("us") {
        return term[..term.len() - 1].to_string();
    }
    term.to_string()
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        "hashing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_text(
        &self,
        texts: &[&str],
        config: &EmbeddingConfig,
    ) -> Result<Vec<EmbeddingOutput>, EmbedError> {
        trace!("Hashing {} texts", texts.len());
        Ok(texts
            .iter()
            .map(|text| self.embed_one(text, config.normalize))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if na == 0.0 || nb == 0.0 {
            0.0
        } else {
            dot / (na * nb)
        }
    }

    #[test]
    fn test_hashing_default() {
        let embedder = HashingEmbedder::default();
        assert_eq!(embedder.dimension(), DEFAULT_DIMENSION);
        assert_eq!(embedder.model_name(), "hashing");
    }

    #[test]
    fn test_hashing_rejects_zero_dimension() {
        assert!(HashingEmbedder::new(0).is_err());
        assert_eq!(HashingEmbedder::new(64).unwrap().dimension(), 64);
    }

    #[test]
    fn test_terms_drop_stopwords_and_stem() {
        let terms = HashingEmbedder::terms("The Cats are  mammals, and the studies!");
        assert_eq!(terms, vec!["cat", "mammal", "study"]);
    }

    #[test]
    fn test_stem_keeps_short_and_double_s() {
        assert_eq!(stem("gas"), "gas");
        assert_eq!(stem("glass"), "glass");
        assert_eq!(stem("status"), "status");
        assert_eq!(stem("charts"), "chart");
    }

    #[tokio::test]
    async fn test_hashing_is_deterministic() {
        let embedder = HashingEmbedder::default();
        let config = EmbeddingConfig::default();
        let a = embedder.embed_text(&["bar chart"], &config).await.unwrap();
        let b = embedder.embed_text(&["bar chart"], &config).await.unwrap();
        assert_eq!(a[0].embedding, b[0].embedding);
    }

    #[tokio::test]
    async fn test_hashing_normalized() {
        let embedder = HashingEmbedder::default();
        let outputs = embedder
            .embed_text(&["revenue grew in every quarter"], &EmbeddingConfig::default())
            .await
            .unwrap();
        let norm: f32 = outputs[0]
            .embedding
            .iter()
            .map(|v| v * v)
            .sum::<f32>()
            .sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_hashing_without_terms_is_zero_vector() {
        let embedder = HashingEmbedder::default();
        let outputs = embedder
            .embed_text(&["the of and"], &EmbeddingConfig::default())
            .await
            .unwrap();
        assert!(outputs[0].embedding.iter().all(|&v| v == 0.0));
        assert_eq!(outputs[0].token_count, 0);
    }

    #[tokio::test]
    async fn test_hashing_overlap_is_closer() {
        let embedder = HashingEmbedder::default();
        let config = EmbeddingConfig::default();
        let outputs = embedder
            .embed_text(
                &[
                    "a bar chart showing quarterly revenue",
                    "revenue chart",
                    "cats sleeping in the sun",
                ],
                &config,
            )
            .await
            .unwrap();

        let related = cosine(&outputs[0].embedding, &outputs[1].embedding);
        let unrelated = cosine(&outputs[0].embedding, &outputs[2].embedding);
        assert!(related > unrelated);
        assert!(related > 0.4);
    }

    #[tokio::test]
    async fn test_hashing_embed_query_default() {
        let embedder = HashingEmbedder::default();
        let query = embedder
            .embed_query("cats", &EmbeddingConfig::default())
            .await
            .unwrap();
        assert_eq!(query.token_count, 1);
    }
}

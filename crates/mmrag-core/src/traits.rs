//! Core traits for mmrag components.
//!
//! - [`Embedder`]: Generate vector embeddings
//! - [`ContentStore`]: Identifier-keyed payload storage
//! - [`EmbeddingIndex`]: Embed keys and rank them against a query
//! - [`DocumentExtractor`]: Pull texts, tables and images out of a document
//! - [`ChatModel`]: Multimodal chat completion

use async_trait::async_trait;
use std::path::Path;

use crate::error::{EmbedError, ExtractError, LlmError, StoreError};
use crate::types::{
    ChatMessage, ContentEntry, EmbeddingConfig, EmbeddingOutput, Extractions, Identifier,
    IndexEntry, IndexHit, Payload, SearchMode,
};

// ============================================================================
// Embedding
// ============================================================================

/// Trait for generating embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model name/identifier.
    fn model_name(&self) -> &str;

    /// Embedding dimension.
    fn dimension(&self) -> usize;

    /// Embed text content.
    async fn embed_text(
        &self,
        texts: &[&str],
        config: &EmbeddingConfig,
    ) -> Result<Vec<EmbeddingOutput>, EmbedError>;

    /// Embed a query (may use different instruction).
    async fn embed_query(
        &self,
        query: &str,
        config: &EmbeddingConfig,
    ) -> Result<EmbeddingOutput, EmbedError> {
        let results = self.embed_text(&[query], config).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Inference("empty embedding result".to_string()))
    }
}

// ============================================================================
// Storage
// ============================================================================

/// Key-value storage from identifier to payload.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Insert entries, overwriting on identifier collision.
    async fn put_many(&self, entries: Vec<ContentEntry>) -> Result<(), StoreError>;

    /// Fetch payloads for `ids`.
    ///
    /// The output has the same length and order as `ids`; unknown identifiers
    /// yield `None`.
    async fn get_many(&self, ids: &[Identifier]) -> Result<Vec<Option<Payload>>, StoreError>;

    /// Number of stored payloads.
    async fn len(&self) -> usize;

    /// Whether the store is empty.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Vector index over embedding keys, carrying identifiers as metadata.
#[async_trait]
pub trait EmbeddingIndex: Send + Sync {
    /// Embed and store each entry's key alongside its identifier.
    async fn add(&self, entries: Vec<IndexEntry>) -> Result<(), StoreError>;

    /// Rank stored entries against `text`.
    ///
    /// Returns at most `k` hits. Similarity hits are ordered by ascending
    /// cosine distance; diverse hits carry [`SearchMode::SENTINEL_SCORE`].
    async fn query(
        &self,
        text: &str,
        k: usize,
        mode: SearchMode,
    ) -> Result<Vec<IndexHit>, StoreError>;

    /// Number of indexed entries.
    async fn len(&self) -> usize;

    /// Whether the index is empty.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// Trait for extracting texts, tables and images from a document.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Extract all content from the document at `path`.
    async fn extract(&self, path: &Path) -> Result<Extractions, ExtractError>;
}

// ============================================================================
// Chat
// ============================================================================

/// A chat model that accepts text and image parts.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model name/identifier.
    fn model_name(&self) -> &str;

    /// Send the full message history and return the assistant reply.
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatMessage, LlmError>;
}

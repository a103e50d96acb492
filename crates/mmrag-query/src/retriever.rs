//! Multi-vector retrieval.
//!
//! The index ranks embedding keys; the content store holds what callers
//! actually want back. A retrieval walks index hits in rank order, keeps the
//! first hit per identifier, and resolves identifiers to payloads. Identifiers
//! with no stored payload are skipped.

use mmrag_core::{
    ContentEntry, ContentStore, EmbeddingIndex, Error, Identifier, IndexEntry, IngestionError,
    Payload, Result, RetrievalResult, ScoredPayload, SearchMode,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::filter::RetrievalDefaults;

/// Retriever settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrieverConfig {
    /// Hits requested from the index per query
    pub top_k: usize,
    /// Ranking mode passed to the index
    pub mode: SearchMode,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            top_k: RetrievalDefaults::TOP_K,
            mode: SearchMode::Similarity,
        }
    }
}

/// Which payload variant text ingestion produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Prose,
    Table,
}

impl TextKind {
    fn payload(self, text: String) -> Payload {
        match self {
            Self::Prose => Payload::Text { text },
            Self::Table => Payload::Table { text },
        }
    }
}

/// Retriever over an embedding index and a content store joined by identifier.
pub struct MultiVectorRetriever {
    index: Arc<dyn EmbeddingIndex>,
    store: Arc<dyn ContentStore>,
    config: RetrieverConfig,
    /// Held for writing across the dual write, for reading during retrieval
    gate: RwLock<()>,
}

impl MultiVectorRetriever {
    /// Create a retriever. `top_k` must be at least 1.
    pub fn new(
        index: Arc<dyn EmbeddingIndex>,
        store: Arc<dyn ContentStore>,
        config: RetrieverConfig,
    ) -> Result<Self> {
        if config.top_k == 0 {
            return Err(Error::Config("top_k must be at least 1".to_string()));
        }
        Ok(Self {
            index,
            store,
            config,
            gate: RwLock::new(()),
        })
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Retrieve the payloads most relevant to `query`, in index rank order.
    pub async fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        let _read = self.gate.read().await;
        debug!("Retrieving for query: {}", query);

        let hits = self
            .index
            .query(query, self.config.top_k, self.config.mode)
            .await?;

        let mut seen = HashSet::with_capacity(hits.len());
        let unique: Vec<_> = hits.into_iter().filter(|hit| seen.insert(hit.id)).collect();
        let ids: Vec<Identifier> = unique.iter().map(|hit| hit.id).collect();

        let payloads = self.store.get_many(&ids).await?;

        let mut items = Vec::with_capacity(unique.len());
        for (hit, payload) in unique.into_iter().zip(payloads) {
            match payload {
                Some(payload) => items.push(ScoredPayload {
                    payload,
                    score: hit.score,
                }),
                None => debug!("No payload stored for {}, skipping", hit.id),
            }
        }

        debug!("Retrieved {} items", items.len());
        Ok(RetrievalResult {
            mode: self.config.mode,
            items,
        })
    }

    /// Ingest text items keyed by `keys` (summaries or the texts themselves).
    pub async fn add_texts(
        &self,
        keys: Vec<String>,
        values: Vec<String>,
        kind: TextKind,
    ) -> Result<Vec<Identifier>> {
        let payloads = values.into_iter().map(|v| kind.payload(v)).collect();
        self.ingest(keys, payloads).await
    }

    /// Ingest figures keyed by their summaries.
    pub async fn add_images(
        &self,
        summaries: Vec<String>,
        paths: Vec<PathBuf>,
    ) -> Result<Vec<Identifier>> {
        let payloads = paths.into_iter().map(|path| Payload::Image { path }).collect();
        self.ingest(summaries, payloads).await
    }

    /// Store `payloads` and index `keys` under freshly minted identifiers.
    ///
    /// Returns the identifiers, aligned with the input. The content store is
    /// written first; if the index write then fails the stored payloads are
    /// left behind unreachable and the error is returned.
    pub async fn ingest(
        &self,
        keys: Vec<String>,
        payloads: Vec<Payload>,
    ) -> Result<Vec<Identifier>> {
        if keys.is_empty() && payloads.is_empty() {
            return Ok(Vec::new());
        }
        if keys.len() != payloads.len() {
            return Err(IngestionError::LengthMismatch {
                keys: keys.len(),
                values: payloads.len(),
            }
            .into());
        }

        let ids: Vec<Identifier> = (0..keys.len()).map(|_| Identifier::new()).collect();
        let contents = ids
            .iter()
            .zip(payloads)
            .map(|(&id, payload)| ContentEntry { id, payload })
            .collect();
        let entries = ids
            .iter()
            .zip(keys)
            .map(|(&id, embedding_key)| IndexEntry { embedding_key, id })
            .collect();

        let _write = self.gate.write().await;
        self.store.put_many(contents).await?;
        if let Err(e) = self.index.add(entries).await {
            warn!(
                "Index write failed after storing {} payloads; they are unreachable: {}",
                ids.len(),
                e
            );
            return Err(e.into());
        }

        info!("Ingested {} items", ids.len());
        Ok(ids)
    }
}

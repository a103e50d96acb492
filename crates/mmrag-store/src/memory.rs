//! In-memory content store.
//!
//! [`MemoryContentStore`] maps identifiers to payloads. It holds the originals
//! (prose, tables, image paths) that the embedding index only points at.

use async_trait::async_trait;
use mmrag_core::{ContentEntry, ContentStore, Identifier, Payload, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Identifier-keyed payload store backed by a `HashMap`.
///
/// # Example
///
/// ```rust
/// use mmrag_core::{ContentEntry, ContentStore, Identifier, Payload};
/// use mmrag_store::MemoryContentStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryContentStore::new();
/// let id = Identifier::new();
/// store
///     .put_many(vec![ContentEntry { id, payload: Payload::text("hello") }])
///     .await?;
///
/// let found = store.get_many(&[id, Identifier::new()]).await?;
/// assert_eq!(found, vec![Some(Payload::text("hello")), None]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct MemoryContentStore {
    payloads: Arc<RwLock<HashMap<Identifier, Payload>>>,
}

impl MemoryContentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put_many(&self, entries: Vec<ContentEntry>) -> Result<(), StoreError> {
        let count = entries.len();
        let mut payloads = self.payloads.write().await;
        for entry in entries {
            payloads.insert(entry.id, entry.payload);
        }
        debug!("Stored {} payloads ({} total)", count, payloads.len());
        Ok(())
    }

    async fn get_many(&self, ids: &[Identifier]) -> Result<Vec<Option<Payload>>, StoreError> {
        let payloads = self.payloads.read().await;
        Ok(ids.iter().map(|id| payloads.get(id).cloned()).collect())
    }

    async fn len(&self) -> usize {
        self.payloads.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_content_store_new_is_empty() {
        let store = MemoryContentStore::new();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_content_store_put_and_get() {
        let store = MemoryContentStore::new();
        let a = Identifier::new();
        let b = Identifier::new();

        store
            .put_many(vec![
                ContentEntry {
                    id: a,
                    payload: Payload::text("alpha"),
                },
                ContentEntry {
                    id: b,
                    payload: Payload::image("/figs/b.jpg"),
                },
            ])
            .await
            .unwrap();

        assert_eq!(store.len().await, 2);
        let found = store.get_many(&[b, a]).await.unwrap();
        assert_eq!(
            found,
            vec![Some(Payload::image("/figs/b.jpg")), Some(Payload::text("alpha"))]
        );
    }

    #[tokio::test]
    async fn test_content_store_unknown_ids_are_none() {
        let store = MemoryContentStore::new();
        let known = Identifier::new();
        store
            .put_many(vec![ContentEntry {
                id: known,
                payload: Payload::table("a | b"),
            }])
            .await
            .unwrap();

        let found = store
            .get_many(&[Identifier::new(), known, Identifier::new()])
            .await
            .unwrap();
        assert_eq!(found.len(), 3);
        assert!(found[0].is_none());
        assert_eq!(found[1], Some(Payload::table("a | b")));
        assert!(found[2].is_none());
    }

    #[tokio::test]
    async fn test_content_store_overwrites_on_collision() {
        let store = MemoryContentStore::new();
        let id = Identifier::new();
        for text in ["first", "second"] {
            store
                .put_many(vec![ContentEntry {
                    id,
                    payload: Payload::text(text),
                }])
                .await
                .unwrap();
        }

        assert_eq!(store.len().await, 1);
        assert_eq!(
            store.get_many(&[id]).await.unwrap(),
            vec![Some(Payload::text("second"))]
        );
    }

    #[tokio::test]
    async fn test_content_store_get_empty_ids() {
        let store = MemoryContentStore::new();
        assert!(store.get_many(&[]).await.unwrap().is_empty());
    }
}

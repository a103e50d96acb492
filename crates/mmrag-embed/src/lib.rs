//! # mmrag-embed
//!
//! Embedding backends for the mmrag embedding index.
//!
//! ## Cargo Features
//!
//! - `candle`: Enables [`CandleEmbedder`] (`thenlper/gte-small`, 384 dimensions)
//! - Without `candle`: Only [`HashingEmbedder`] is available
//!
//! ## Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HashingEmbedder`] | Offline, deterministic feature hashing (always available) |
//! | [`EmbedderPool`] | Concurrency-limited wrapper around any embedder (always available) |
//! | [`CandleEmbedder`] | Transformer embeddings using `gte-small` (requires `candle` feature) |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mmrag_embed::{EmbedderPool, HashingEmbedder};
//! use std::sync::Arc;
//!
//! let pool = EmbedderPool::new(Arc::new(HashingEmbedder::default()), 4);
//! let index = MemoryEmbeddingIndex::new(Arc::new(pool));
//! ```

#[cfg(feature = "candle")]
pub mod candle;

#[cfg(feature = "candle")]
pub use candle::CandleEmbedder;

pub mod hashing;
pub mod pool;

pub use hashing::{HashingEmbedder, DEFAULT_DIMENSION};
pub use pool::EmbedderPool;

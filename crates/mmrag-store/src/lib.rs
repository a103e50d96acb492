//! Storage layer for mmrag.
//!
//! The two tiers of the multi-vector retriever:
//!
//! - [`MemoryContentStore`]: identifier to payload
//! - [`MemoryEmbeddingIndex`]: embedding key vectors with identifier metadata,
//!   ranked by cosine distance or maximal marginal relevance
//!
//! # Example
//!
//! ```rust,ignore
//! use mmrag_embed::HashingEmbedder;
//! use mmrag_store::{MemoryContentStore, MemoryEmbeddingIndex};
//!
//! let index = MemoryEmbeddingIndex::new(Arc::new(HashingEmbedder::default()));
//! let store = MemoryContentStore::new();
//! ```

pub mod index;
pub mod memory;

pub use index::{
    cosine_distance, cosine_similarity, DiversityConfig, MemoryEmbeddingIndex, DEFAULT_FETCH_K,
    DEFAULT_LAMBDA_MULT,
};
pub use memory::MemoryContentStore;

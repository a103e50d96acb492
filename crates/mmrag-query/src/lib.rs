//! Retrieval for mmrag.
//!
//! [`MultiVectorRetriever`] ranks embedding keys in an
//! [`EmbeddingIndex`](mmrag_core::EmbeddingIndex) and returns the payloads
//! stored under the same identifiers in a
//! [`ContentStore`](mmrag_core::ContentStore). [`filter_by_threshold`] trims a
//! result to items within a distance bound.
//!
//! # Example
//!
//! ```rust,ignore
//! use mmrag_query::{filter_by_threshold, MultiVectorRetriever, RetrievalDefaults, RetrieverConfig};
//!
//! let retriever = MultiVectorRetriever::new(index, store, RetrieverConfig::default())?;
//! let result = retriever.retrieve("what drives revenue?").await?;
//! let close = filter_by_threshold(result, RetrievalDefaults::STRICT);
//! ```

pub mod filter;
pub mod retriever;

pub use filter::{filter_by_threshold, RetrievalDefaults};
pub use retriever::{MultiVectorRetriever, RetrieverConfig, TextKind};

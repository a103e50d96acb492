//! # mmrag-core
//!
//! Core types and traits for mmrag, a multimodal retrieval pipeline over PDF
//! documents.
//!
//! Every retrievable item is stored twice: its *embedding key* (a summary or
//! the raw text) goes into an [`EmbeddingIndex`], its *payload* (the original
//! text, table or image path) goes into a [`ContentStore`]. Both rows share a
//! freshly minted [`Identifier`], which is how queries over the keys get
//! joined back to payloads.
//!
//! ## Architecture
//!
//! ```text
//! PDF -> DocumentExtractor -> Extractions -> ChatModel (summaries)
//!                                                 |
//!                      IndexEntry (key, id) <-----+-----> ContentEntry (id, payload)
//!                             |                                  |
//!                      EmbeddingIndex                      ContentStore
//!                             \________ query -> ids -> payloads __/
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Identifier`] | UUID joining index rows to content rows |
//! | [`Payload`] | Text, table or image reference |
//! | [`RetrievalResult`] | Ranked payloads with scores and the mode that produced them |
//! | [`Extractions`] | Texts, tables and images pulled from a document |
//! | [`ChatMessage`] | Multimodal chat turn |
//!
//! ## Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Embedder`] | Generate vector embeddings |
//! | [`ContentStore`] | Store payloads by identifier |
//! | [`EmbeddingIndex`] | Embed keys and rank them |
//! | [`DocumentExtractor`] | Extract content from documents |
//! | [`ChatModel`] | Multimodal chat completion |
//!
//! ## Related Crates
//!
//! - `mmrag-store`: In-memory content store and embedding index
//! - `mmrag-embed`: Embedding backends
//! - `mmrag-extract`: PDF extraction
//! - `mmrag-llm`: Summaries and answers
//! - `mmrag-query`: Multi-vector retriever
//! - `mmrag-index`: Document ingestion pipeline

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    EmbedError, Error, ExtractError, IngestionError, LlmError, Result, StoreError,
};
pub use traits::*;
pub use types::*;

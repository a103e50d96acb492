//! Ingestion pipeline for mmrag.
//!
//! [`build_retriever`] takes a document through extraction, summarization and
//! loading into a [`MultiVectorRetriever`](mmrag_query::MultiVectorRetriever).
//! An [`IngestionProfile`] picks chunk sizes and whether texts and tables are
//! summarized before embedding.
//!
//! # Example
//!
//! ```rust,ignore
//! use mmrag_index::{build_retriever, IngestionProfile};
//!
//! let profile = IngestionProfile::retrieval_only();
//! let extractor = profile.extractor()?;
//! let report = build_retriever(&path, &profile, &extractor, &summarizer, &retriever).await?;
//! println!("{} items ingested", report.total());
//! ```

pub mod pipeline;

pub use pipeline::{build_retriever, IngestionProfile, IngestionReport};

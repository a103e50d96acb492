//! Core types for mmrag.
//!
//! ## Storage
//! - [`Identifier`]: Join key between the embedding index and the content store
//! - [`Payload`]: What a retrieval returns (text, table or image reference)
//! - [`IndexEntry`] / [`ContentEntry`]: Rows written by ingestion
//!
//! ## Retrieval
//! - [`IndexHit`]: One ranked row reported by an embedding index
//! - [`ScoredPayload`]: A payload with its distance score
//! - [`RetrievalResult`]: Ranked, deduplicated payloads plus the mode that produced them
//! - [`SearchMode`]: Similarity ranking or diverse (MMR) ranking
//!
//! ## Extraction
//! - [`Extraction`] / [`Extractions`]: Content pulled out of a document
//!
//! ## Embeddings
//! - [`EmbeddingConfig`] / [`EmbeddingOutput`]
//!
//! ## Chat
//! - [`ChatMessage`], [`ContentPart`], [`Role`]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque identifier minted once per ingested item.
///
/// It is never derived from content, so ingesting the same text twice yields
/// two independent entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(Uuid);

impl Identifier {
    /// Mint a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Discriminant of a [`Payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    Text,
    Table,
    Image,
}

/// A retrievable unit stored in the content store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Payload {
    /// A chunk of prose
    Text { text: String },
    /// A table rendered as text
    Table { text: String },
    /// Reference to an image file on disk
    Image { path: PathBuf },
}

impl Payload {
    /// Create a text payload.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a table payload.
    pub fn table(text: impl Into<String>) -> Self {
        Self::Table { text: text.into() }
    }

    /// Create an image payload.
    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self::Image { path: path.into() }
    }

    /// The kind of this payload.
    #[must_use]
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Text { .. } => PayloadKind::Text,
            Self::Table { .. } => PayloadKind::Table,
            Self::Image { .. } => PayloadKind::Image,
        }
    }

    /// Text content for text-bearing payloads.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } | Self::Table { text } => Some(text),
            Self::Image { .. } => None,
        }
    }

    /// Image path for image payloads.
    #[must_use]
    pub fn image_path(&self) -> Option<&Path> {
        match self {
            Self::Image { path } => Some(path),
            _ => None,
        }
    }

    /// Human-readable content: the text, or the image path.
    #[must_use]
    pub fn display_content(&self) -> String {
        match self {
            Self::Text { text } | Self::Table { text } => text.clone(),
            Self::Image { path } => path.display().to_string(),
        }
    }
}

/// A row in the embedding index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Text that gets embedded (a summary or the raw content)
    pub embedding_key: String,
    /// Identifier of the payload this key points at
    pub id: Identifier,
}

/// A row in the content store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub id: Identifier,
    pub payload: Payload,
}

// ============================================================================
// Retrieval
// ============================================================================

/// Ranking mode of an embedding index query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Nearest neighbours by cosine distance
    #[default]
    Similarity,
    /// Maximal marginal relevance; scores are a fixed sentinel
    Diverse,
}

impl SearchMode {
    /// Score reported for every hit in diverse mode.
    pub const SENTINEL_SCORE: f32 = 0.0;
}

/// One ranked row returned by an embedding index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexHit {
    pub id: Identifier,
    /// Cosine distance, or [`SearchMode::SENTINEL_SCORE`] in diverse mode
    pub score: f32,
}

/// A retrieved payload with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPayload {
    pub payload: Payload,
    /// Distance to the query (lower is more similar)
    pub score: f32,
}

/// Ranked retrieval output.
///
/// Items are in index rank order with no duplicate identifiers. The mode is
/// carried along because diverse-mode scores are sentinels and must not be
/// compared with similarity distances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub mode: SearchMode,
    pub items: Vec<ScoredPayload>,
}

impl RetrievalResult {
    /// An empty result for the given mode.
    #[must_use]
    pub fn empty(mode: SearchMode) -> Self {
        Self {
            mode,
            items: Vec::new(),
        }
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the items in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, ScoredPayload> {
        self.items.iter()
    }

    /// Whether the scores are real distances.
    #[must_use]
    pub fn scores_comparable(&self) -> bool {
        self.mode == SearchMode::Similarity
    }
}

impl<'a> IntoIterator for &'a RetrievalResult {
    type Item = &'a ScoredPayload;
    type IntoIter = std::slice::Iter<'a, ScoredPayload>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// Kind of extracted element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionKind {
    Text,
    Table,
    Image,
}

/// A single element extracted from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub kind: ExtractionKind,
    /// Text content, or the image path for [`ExtractionKind::Image`]
    pub content: String,
}

impl Extraction {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: ExtractionKind::Text,
            content: content.into(),
        }
    }

    pub fn table(content: impl Into<String>) -> Self {
        Self {
            kind: ExtractionKind::Table,
            content: content.into(),
        }
    }

    pub fn image(path: impl AsRef<Path>) -> Self {
        Self {
            kind: ExtractionKind::Image,
            content: path.as_ref().display().to_string(),
        }
    }
}

/// Everything extracted from one document, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extractions {
    pub texts: Vec<Extraction>,
    pub tables: Vec<Extraction>,
    pub images: Vec<Extraction>,
}

impl Extractions {
    /// Drop text and table items with empty content. Images are kept as-is.
    #[must_use]
    pub fn remove_empty(self) -> Self {
        Self {
            texts: self
                .texts
                .into_iter()
                .filter(|e| !e.content.is_empty())
                .collect(),
            tables: self
                .tables
                .into_iter()
                .filter(|e| !e.content.is_empty())
                .collect(),
            images: self.images,
        }
    }

    /// Total number of extracted items.
    #[must_use]
    pub fn total(&self) -> usize {
        self.texts.len() + self.tables.len() + self.images.len()
    }
}

// ============================================================================
// Embedding
// ============================================================================

/// Configuration for embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Normalize embeddings to unit length
    pub normalize: bool,
    /// Batch size for processing
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            batch_size: 32,
        }
    }
}

/// Output from embedding.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// The embedding vector
    pub embedding: Vec<f32>,
    /// Number of tokens in input
    pub token_count: usize,
}

// ============================================================================
// Chat
// ============================================================================

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One part of a multimodal chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    /// Base64-encoded JPEG data (no data URI prefix)
    Image { base64_jpeg: String },
}

/// A chat message made of text and image parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub parts: Vec<ContentPart>,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            parts: vec![ContentPart::Text { text: text.into() }],
        }
    }

    pub fn user(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            parts: vec![ContentPart::Text { text: text.into() }],
        }
    }

    /// Concatenated text parts.
    #[must_use]
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Base64 images attached to this message.
    pub fn images(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            ContentPart::Image { base64_jpeg } => Some(base64_jpeg.as_str()),
            ContentPart::Text { .. } => None,
        })
    }
}

//! Chat-model collaborators for mmrag.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`OllamaChat`] | [`ChatModel`](mmrag_core::ChatModel) over the Ollama `/api/chat` endpoint |
//! | [`Summarizer`] | Bounded-concurrency summaries used as embedding keys |
//! | [`AnswerGenerator`] | Multimodal answers with an explicit [`Conversation`] |
//!
//! The [`prompt`] module holds the default templates and the `render` /
//! `parse_text` stages around each model call.

pub mod answer;
pub mod ollama;
pub mod prompt;
pub mod summary;

pub use answer::{AnswerGenerator, Conversation};
pub use ollama::{OllamaChat, OllamaConfig};
pub use prompt::{parse_text, render};
pub use summary::{Summarizer, SummaryPrompts, DEFAULT_MAX_CONCURRENCY, DEFAULT_NUM_WORDS};

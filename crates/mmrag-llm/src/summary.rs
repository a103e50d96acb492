//! Summaries used as embedding keys.
//!
//! Each extraction gets one chat call: the system prompt, then a user turn
//! built from the kind's template. Images are attached as base64 JPEG.

use futures::future::try_join_all;
use mmrag_core::{ChatMessage, ChatModel, ContentPart, Extraction, ExtractionKind, LlmError};
use mmrag_extract::encode_image_base64;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::prompt::{
    parse_text, render, SUMMARY_PROMPT_IMAGE, SUMMARY_PROMPT_TABLE, SUMMARY_PROMPT_TEXT,
    SUMMARY_SYSTEM_PROMPT,
};

/// Default number of in-flight summary requests.
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Default summary length in words.
pub const DEFAULT_NUM_WORDS: usize = 100;

/// Prompt templates for each extraction kind.
///
/// Templates may reference `{extraction_content}` and `{num_words}`.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryPrompts {
    pub system: String,
    pub text: String,
    pub table: String,
    pub image: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            system: SUMMARY_SYSTEM_PROMPT.to_string(),
            text: SUMMARY_PROMPT_TEXT.to_string(),
            table: SUMMARY_PROMPT_TABLE.to_string(),
            image: SUMMARY_PROMPT_IMAGE.to_string(),
        }
    }
}

impl SummaryPrompts {
    fn for_kind(&self, kind: ExtractionKind) -> &str {
        match kind {
            ExtractionKind::Text => &self.text,
            ExtractionKind::Table => &self.table,
            ExtractionKind::Image => &self.image,
        }
    }
}

/// Batch summarizer over a [`ChatModel`].
#[derive(Clone)]
pub struct Summarizer {
    model: Arc<dyn ChatModel>,
    prompts: SummaryPrompts,
    num_words: usize,
    max_concurrency: usize,
}

impl Summarizer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            prompts: SummaryPrompts::default(),
            num_words: DEFAULT_NUM_WORDS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    #[must_use]
    pub fn with_prompts(mut self, prompts: SummaryPrompts) -> Self {
        self.prompts = prompts;
        self
    }

    #[must_use]
    pub fn with_num_words(mut self, num_words: usize) -> Self {
        self.num_words = num_words;
        self
    }

    /// Limit concurrent model calls. Zero is raised to one.
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn num_words(&self) -> usize {
        self.num_words
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Summarize `items`, returning one summary per item in input order.
    ///
    /// The first failing call fails the whole batch.
    pub async fn summarize(&self, items: &[Extraction]) -> Result<Vec<String>, LlmError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        info!(
            "Summarizing {} items with {} (max {} concurrent)",
            items.len(),
            self.model.model_name(),
            self.max_concurrency
        );
        let permits = Semaphore::new(self.max_concurrency);

        let calls = items.iter().enumerate().map(|(i, item)| {
            let permits = &permits;
            async move {
                let _permit = permits
                    .acquire()
                    .await
                    .map_err(|e| LlmError::BackendUnavailable(format!("semaphore error: {e}")))?;
                let messages = self.build_messages(item).await?;
                let reply = self.model.invoke(&messages).await?;
                debug!("Summary {} of {} done", i + 1, items.len());
                Ok::<_, LlmError>(parse_text(&reply))
            }
        });

        try_join_all(calls).await
    }

    /// Messages sent to the model for one extraction.
    pub async fn build_messages(&self, item: &Extraction) -> Result<Vec<ChatMessage>, LlmError> {
        let num_words = self.num_words.to_string();
        let vars = [
            ("extraction_content", item.content.as_str()),
            ("num_words", num_words.as_str()),
        ];

        let system = render(&self.prompts.system, &vars)?;
        let text = render(self.prompts.for_kind(item.kind), &vars)?;

        let mut parts = Vec::with_capacity(2);
        if item.kind == ExtractionKind::Image {
            let base64_jpeg = encode_image_base64(Path::new(&item.content))
                .await
                .map_err(|e| LlmError::Image(format!("{}: {e}", item.content)))?;
            parts.push(ContentPart::Image { base64_jpeg });
        }
        parts.push(ContentPart::Text { text });

        Ok(vec![ChatMessage::system(system), ChatMessage::user(parts)])
    }
}

//! Answer generation over retrieved payloads.
//!
//! The chat history lives in an explicit [`Conversation`] value that the
//! caller owns. [`AnswerGenerator::answer`] never mutates its input; it returns
//! the extended conversation alongside the answer, so a failed call leaves the
//! caller's history untouched.

use mmrag_core::{ChatMessage, ChatModel, ContentPart, LlmError, Payload, RetrievalResult};
use mmrag_extract::encode_image_base64;
use std::sync::Arc;
use tracing::debug;

use crate::prompt::{parse_text, render, ANSWER_QUESTION_PROMPT, ANSWER_SYSTEM_PROMPT};

/// Ordered chat history, starting with the system message.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of turns, including the system message.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Answers questions from retrieved texts, tables and figures.
#[derive(Clone)]
pub struct AnswerGenerator {
    model: Arc<dyn ChatModel>,
    system_prompt: String,
    question_prompt: String,
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            system_prompt: ANSWER_SYSTEM_PROMPT.to_string(),
            question_prompt: ANSWER_QUESTION_PROMPT.to_string(),
        }
    }

    /// Replace the prompts. The question prompt may use `{question}` and `{rel_text}`.
    #[must_use]
    pub fn with_prompts(
        mut self,
        system_prompt: impl Into<String>,
        question_prompt: impl Into<String>,
    ) -> Self {
        self.system_prompt = system_prompt.into();
        self.question_prompt = question_prompt.into();
        self
    }

    /// A fresh conversation holding only the system message.
    pub fn start_conversation(&self) -> Conversation {
        Conversation::new(self.system_prompt.clone())
    }

    /// Build the user turn for `query` from `result`.
    ///
    /// Figures become image parts; texts and tables are joined by newlines into
    /// the question prompt, which is the last part.
    pub async fn build_turn(
        &self,
        result: &RetrievalResult,
        query: &str,
    ) -> Result<ChatMessage, LlmError> {
        let mut parts = Vec::new();
        let mut texts = Vec::new();

        for item in result {
            match &item.payload {
                Payload::Image { path } => {
                    let base64_jpeg = encode_image_base64(path)
                        .await
                        .map_err(|e| LlmError::Image(format!("{}: {e}", path.display())))?;
                    parts.push(ContentPart::Image { base64_jpeg });
                }
                Payload::Text { text } | Payload::Table { text } => texts.push(text.as_str()),
            }
        }

        let rel_text = texts.join("\n");
        let text = render(
            &self.question_prompt,
            &[("question", query), ("rel_text", rel_text.as_str())],
        )?;
        debug!(
            "Built turn with {} images and {} text items",
            parts.len(),
            texts.len()
        );
        parts.push(ContentPart::Text { text });

        Ok(ChatMessage::user(parts))
    }

    /// Ask `query` in the context of `conversation`.
    ///
    /// Returns the conversation extended by the user turn and the reply, plus
    /// the answer text.
    pub async fn answer(
        &self,
        conversation: &Conversation,
        query: &str,
        result: &RetrievalResult,
    ) -> Result<(Conversation, String), LlmError> {
        let turn = self.build_turn(result, query).await?;

        let mut next = conversation.clone();
        next.messages.push(turn);
        let reply = self.model.invoke(&next.messages).await?;
        let answer = parse_text(&reply);
        next.messages.push(reply);

        Ok((next, answer))
    }
}

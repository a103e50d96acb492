//! Prompt templates and the pure stages of a chat call.
//!
//! A call is `render` -> [`ChatModel::invoke`](mmrag_core::ChatModel::invoke)
//! -> [`parse_text`]. Templates use `{name}` placeholders; `{{` and `}}`
//! produce literal braces.

use mmrag_core::{ChatMessage, LlmError};

pub const SUMMARY_SYSTEM_PROMPT: &str = "In the field of machine learning and large language \
models, you excel at summarizing research papers. You can analyze text excerpts, tables, or \
images and extract the key points in a clear and concise way.";

pub const SUMMARY_PROMPT_TEXT: &str = "In the context of machine learning, summarize the \
following text chunk in {num_words} words, highlighting the most important information which \
can be extracted from it. Text chunk: {extraction_content}";

pub const SUMMARY_PROMPT_TABLE: &str = "In the context of machine learning, summarize the \
following table in {num_words} words, highlighting the most important information which can \
be extracted from it. Table: {extraction_content}";

pub const SUMMARY_PROMPT_IMAGE: &str = "In the context of machine learning, summarize the \
following image in {num_words} words, highlighting the most important information which can \
be extracted from it.";

pub const ANSWER_SYSTEM_PROMPT: &str = "You are machine learning expert on large language \
models. You are very good in giving precise and concise answer to questions about research \
papers. For every answer you are using provided text excerpts and images from that research \
paper. Based on them you answer to the question.";

pub const ANSWER_QUESTION_PROMPT: &str = "Based on the provided text, tables and images from \
the research paper answer this question: {question}\nThis is the provided text and images: \
{rel_text}";

/// Substitute `{name}` placeholders from `vars`.
///
/// Variables not referenced by the template are ignored. A placeholder with
/// no matching variable is an error.
pub fn render(template: &str, vars: &[(&str, &str)]) -> Result<String, LlmError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('}') {
            return Err(LlmError::Template(format!(
                "unmatched '}}' at offset {}",
                template.len() - tail.len()
            )));
        } else {
            let end = tail
                .find('}')
                .ok_or_else(|| LlmError::Template("unclosed '{' in template".to_string()))?;
            let name = &tail[1..end];
            let value = vars
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
                .ok_or_else(|| LlmError::Template(format!("unknown placeholder {{{name}}}")))?;
            out.push_str(value);
            rest = &tail[end + 1..];
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// Text of a model reply, trimmed.
pub fn parse_text(message: &ChatMessage) -> String {
    message.text().trim().to_string()
}

//! Element detection and title-based chunking.
//!
//! Raw page text is split on blank lines into [`Element`]s. Tables are pulled
//! out as their own items; the remaining headings and paragraphs are packed
//! into chunks that respect section boundaries and the size limits of
//! [`ExtractionConfig`].

use crate::config::ExtractionConfig;

/// A block of text recognised in the extracted page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Heading(String),
    Paragraph(String),
    Table(String),
}

/// Split text into elements on blank lines.
pub fn build_elements(text: &str) -> Vec<Element> {
    let normalized = text.replace('\x0C', "\n\n").replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(|block| {
            if looks_like_table(block) {
                Element::Table(block.to_string())
            } else if looks_like_heading(block) {
                Element::Heading(block.to_string())
            } else {
                Element::Paragraph(block.to_string())
            }
        })
        .collect()
}

/// Short, single-line, mostly capitalised text without a trailing period.
pub fn looks_like_heading(text: &str) -> bool {
    if text.len() > 100 || text.ends_with('.') || text.contains('\n') {
        return false;
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || words.len() > 8 {
        return false;
    }
    let capitalised = words
        .iter()
        .filter(|w| w.chars().next().is_some_and(|c| c.is_uppercase() || c.is_ascii_digit()))
        .count();
    capitalised * 2 >= words.len()
}

/// At least two lines, each splitting into two or more columns.
pub fn looks_like_table(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    lines.len() >= 2 && lines.iter().all(|line| column_count(line) >= 2)
}

fn column_count(line: &str) -> usize {
    if line.contains('|') {
        return line
            .split('|')
            .filter(|cell| !cell.trim().is_empty())
            .count();
    }
    if line.contains('\t') {
        return line
            .split('\t')
            .filter(|cell| !cell.trim().is_empty())
            .count();
    }
    line.split("  ")
        .filter(|cell| !cell.trim().is_empty())
        .count()
}

/// Tables and text chunks produced from one document's text.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChunkedText {
    pub texts: Vec<String>,
    pub tables: Vec<String>,
}

/// Pack elements into chunks, starting a new section at every heading.
///
/// Every returned text chunk is at most `max_characters` long.
pub fn chunk_by_title(elements: Vec<Element>, config: &ExtractionConfig) -> ChunkedText {
    let max = config.max_characters.max(1);
    let soft = config.new_after_n_chars.clamp(1, max);

    let mut tables = Vec::new();
    let mut sections: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for element in elements {
        match element {
            Element::Table(text) => tables.push(text),
            Element::Heading(text) => {
                if !current.is_empty() {
                    sections.push(std::mem::take(&mut current));
                }
                current.extend(split_oversized(&text, max));
            }
            Element::Paragraph(text) => current.extend(split_oversized(&text, max)),
        }
    }
    if !current.is_empty() {
        sections.push(current);
    }

    let mut chunks = Vec::new();
    for section in sections {
        pack_section(section, max, soft, &mut chunks);
    }

    ChunkedText {
        texts: combine_small(chunks, config.combine_text_under_n_chars, max),
        tables,
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

const SEPARATOR: &str = "\n\n";

fn pack_section(pieces: Vec<String>, max: usize, soft: usize, out: &mut Vec<String>) {
    let mut chunk = String::new();
    for piece in pieces {
        if chunk.is_empty() {
            chunk = piece;
            continue;
        }
        let full = char_len(&chunk) >= soft;
        let overflow = char_len(&chunk) + SEPARATOR.len() + char_len(&piece) > max;
        if full || overflow {
            out.push(std::mem::replace(&mut chunk, piece));
        } else {
            chunk.push_str(SEPARATOR);
            chunk.push_str(&piece);
        }
    }
    if !chunk.is_empty() {
        out.push(chunk);
    }
}

fn combine_small(chunks: Vec<String>, combine_under: usize, max: usize) -> Vec<String> {
    let mut combined: Vec<String> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        if let Some(last) = combined.last_mut() {
            let fits = char_len(last) + SEPARATOR.len() + char_len(&chunk) <= max;
            if char_len(last) < combine_under && fits {
                last.push_str(SEPARATOR);
                last.push_str(&chunk);
                continue;
            }
        }
        combined.push(chunk);
    }
    combined
}

/// Split `text` into pieces of at most `max` characters, preferring whitespace.
fn split_oversized(text: &str, max: usize) -> Vec<String> {
    if char_len(text) <= max {
        return vec![text.to_string()];
    }

    let mut pieces = Vec::new();
    let mut piece = String::new();
    for word in text.split_whitespace() {
        let needed = if piece.is_empty() {
            char_len(word)
        } else {
            char_len(&piece) + 1 + char_len(word)
        };
        if needed <= max {
            if !piece.is_empty() {
                piece.push(' ');
            }
            piece.push_str(word);
            continue;
        }

        if !piece.is_empty() {
            pieces.push(std::mem::take(&mut piece));
        }
        if char_len(word) <= max {
            piece.push_str(word);
        } else {
            // A single word longer than the limit is cut at character boundaries.
            let chars: Vec<char> = word.chars().collect();
            let mut slices: Vec<String> =
                chars.chunks(max).map(|c| c.iter().collect()).collect();
            piece = slices.pop().unwrap_or_default();
            pieces.extend(slices);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max: usize, soft: usize, combine: usize) -> ExtractionConfig {
        ExtractionConfig::default().with_chunking(max, soft, combine)
    }

    #[test]
    fn test_looks_like_heading() {
        assert!(looks_like_heading("Chapter 1"));
        assert!(looks_like_heading("INTRODUCTION"));
        assert!(looks_like_heading("3 Experimental Results"));
        assert!(!looks_like_heading("This is a normal sentence."));
        assert!(!looks_like_heading(
            "this sentence has no capitals and keeps going well past eight words"
        ));
        assert!(!looks_like_heading("Two\nLines"));
    }

    #[test]
    fn test_looks_like_table() {
        assert!(looks_like_table("Model  Accuracy\nBaseline  0.71\nOurs  0.84"));
        assert!(looks_like_table("a\tb\nc\td"));
        assert!(looks_like_table("| year | revenue |\n| 2023 | 12 |"));
        assert!(!looks_like_table("Model  Accuracy"));
        assert!(!looks_like_table("A plain\nparagraph of text"));
    }

    #[test]
    fn test_build_elements_classifies_blocks() {
        let text = "Introduction\n\nCats are small mammals.\n\nName  Legs\nCat  4\n\n";
        let elements = build_elements(text);
        assert_eq!(
            elements,
            vec![
                Element::Heading("Introduction".to_string()),
                Element::Paragraph("Cats are small mammals.".to_string()),
                Element::Table("Name  Legs\nCat  4".to_string()),
            ]
        );
    }

    #[test]
    fn test_form_feed_separates_pages() {
        let elements = build_elements("First page text.\x0CSecond page text.");
        assert_eq!(elements.len(), 2);
    }

    #[test]
    fn test_tables_are_not_chunked_as_text() {
        let elements = vec![
            Element::Paragraph("Body text.".to_string()),
            Element::Table("a  b\nc  d".to_string()),
        ];
        let chunked = chunk_by_title(elements, &ExtractionConfig::default());
        assert_eq!(chunked.texts, vec!["Body text.".to_string()]);
        assert_eq!(chunked.tables, vec!["a  b\nc  d".to_string()]);
    }

    #[test]
    fn test_heading_starts_new_section() {
        let elements = vec![
            Element::Heading("Methods".to_string()),
            Element::Paragraph("x".repeat(40)),
            Element::Heading("Results".to_string()),
            Element::Paragraph("y".repeat(40)),
        ];
        // combine threshold of 1 disables merging
        let chunked = chunk_by_title(elements, &config(200, 150, 1));
        assert_eq!(chunked.texts.len(), 2);
        assert!(chunked.texts[0].starts_with("Methods"));
        assert!(chunked.texts[1].starts_with("Results"));
    }

    #[test]
    fn test_small_sections_are_combined() {
        let elements = vec![
            Element::Heading("Methods".to_string()),
            Element::Paragraph("short".to_string()),
            Element::Heading("Results".to_string()),
            Element::Paragraph("also short".to_string()),
        ];
        let chunked = chunk_by_title(elements, &config(200, 150, 100));
        assert_eq!(chunked.texts.len(), 1);
        assert!(chunked.texts[0].contains("Methods"));
        assert!(chunked.texts[0].contains("Results"));
    }

    #[test]
    fn test_soft_limit_starts_new_chunk() {
        let elements = vec![
            Element::Paragraph("a".repeat(60)),
            Element::Paragraph("b".repeat(10)),
        ];
        let chunked = chunk_by_title(elements, &config(200, 50, 1));
        assert_eq!(chunked.texts, vec!["a".repeat(60), "b".repeat(10)]);
    }

    #[test]
    fn test_chunks_never_exceed_max_characters() {
        let paragraph = "word ".repeat(300);
        let elements = vec![
            Element::Heading("Long Section".to_string()),
            Element::Paragraph(paragraph),
            Element::Paragraph("z".repeat(250)),
        ];
        let chunked = chunk_by_title(elements, &config(100, 80, 50));
        assert!(!chunked.texts.is_empty());
        assert!(chunked.texts.iter().all(|c| c.chars().count() <= 100));
    }

    #[test]
    fn test_split_oversized_prefers_whitespace() {
        let pieces = split_oversized("alpha beta gamma delta", 11);
        assert_eq!(pieces, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn test_split_oversized_long_word() {
        let pieces = split_oversized(&"x".repeat(25), 10);
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[2], "x".repeat(5));
    }

    #[test]
    fn test_empty_input() {
        let chunked = chunk_by_title(Vec::new(), &ExtractionConfig::default());
        assert!(chunked.texts.is_empty());
        assert!(chunked.tables.is_empty());
    }
}

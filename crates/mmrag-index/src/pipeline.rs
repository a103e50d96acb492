//! Document to retriever ingestion.

use mmrag_core::{DocumentExtractor, ExtractError, Extraction, Result};
use mmrag_extract::{ExtractionConfig, PdfExtractor};
use mmrag_llm::Summarizer;
use mmrag_query::{MultiVectorRetriever, TextKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How a document is chunked and which extractions get summarized.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionProfile {
    /// Chunking and figure output
    pub extraction: ExtractionConfig,
    /// Words per image summary
    pub image_summary_words: usize,
    /// Embed summaries of texts and tables instead of the raw content
    pub summarize_texts: bool,
    /// Words per text or table summary, when `summarize_texts` is set
    pub text_summary_words: usize,
}

impl IngestionProfile {
    /// Small chunks embedded as-is; only figures are summarized.
    pub fn retrieval_only() -> Self {
        Self {
            extraction: ExtractionConfig::default().with_chunking(600, 550, 500),
            image_summary_words: 50,
            summarize_texts: false,
            text_summary_words: 50,
        }
    }

    /// Large chunks, everything summarized before embedding.
    pub fn answering() -> Self {
        Self {
            extraction: ExtractionConfig::default().with_chunking(4000, 3800, 2000),
            image_summary_words: 50,
            summarize_texts: true,
            text_summary_words: 50,
        }
    }

    #[must_use]
    pub fn with_image_dir(mut self, image_dir: impl Into<PathBuf>) -> Self {
        self.extraction = self.extraction.with_image_dir(image_dir);
        self
    }

    /// A PDF extractor using this profile's extraction settings.
    pub fn extractor(&self) -> std::result::Result<PdfExtractor, ExtractError> {
        PdfExtractor::new(self.extraction.clone())
    }
}

/// Items ingested per extraction kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionReport {
    pub texts: usize,
    pub tables: usize,
    pub images: usize,
}

impl IngestionReport {
    pub fn total(&self) -> usize {
        self.texts + self.tables + self.images
    }
}

/// Extract `path`, summarize, and load everything into `retriever`.
///
/// Any failure aborts the build. Items ingested before the failure stay in
/// the retriever.
pub async fn build_retriever(
    path: &Path,
    profile: &IngestionProfile,
    extractor: &dyn DocumentExtractor,
    summarizer: &Summarizer,
    retriever: &MultiVectorRetriever,
) -> Result<IngestionReport> {
    info!("Extracting {:?}", path);
    let extractions = extractor.extract(path).await?.remove_empty();
    info!(
        "Extracted {} texts, {} tables, {} images",
        extractions.texts.len(),
        extractions.tables.len(),
        extractions.images.len()
    );

    info!("Summarizing {} images", extractions.images.len());
    let image_summaries = summarizer
        .clone()
        .with_num_words(profile.image_summary_words)
        .summarize(&extractions.images)
        .await?;
    info!("Image summaries done");

    let (text_keys, table_keys) = if profile.summarize_texts {
        info!(
            "Summarizing {} texts and {} tables",
            extractions.texts.len(),
            extractions.tables.len()
        );
        let text_summarizer = summarizer.clone().with_num_words(profile.text_summary_words);
        let text_keys = text_summarizer.summarize(&extractions.texts).await?;
        let table_keys = text_summarizer.summarize(&extractions.tables).await?;
        info!("Text and table summaries done");
        (text_keys, table_keys)
    } else {
        debug!("Embedding texts and tables as-is");
        (contents(&extractions.texts), contents(&extractions.tables))
    };

    info!("Loading retriever");
    let texts = retriever
        .add_texts(text_keys, contents(&extractions.texts), TextKind::Prose)
        .await?;
    let tables = retriever
        .add_texts(table_keys, contents(&extractions.tables), TextKind::Table)
        .await?;
    let image_paths = extractions
        .images
        .iter()
        .map(|image| PathBuf::from(&image.content))
        .collect();
    let images = retriever.add_images(image_summaries, image_paths).await?;

    let report = IngestionReport {
        texts: texts.len(),
        tables: tables.len(),
        images: images.len(),
    };
    info!("Retriever ready with {} items", report.total());
    Ok(report)
}

fn contents(items: &[Extraction]) -> Vec<String> {
    items.iter().map(|item| item.content.clone()).collect()
}

//! # mmrag CLI
//!
//! Ask questions about the text, tables and figures of a PDF.
//!
//! The document is extracted, its figures (and in answer mode its texts and
//! tables) are summarized by a multimodal chat model, and everything is loaded
//! into an in-memory multi-vector retriever. Queries are then read from stdin.
//!
//! ## Modes
//!
//! - `mmrag <FILEPATH> 0` - print the texts, tables and figures relevant to each query
//! - `mmrag <FILEPATH> 1` - answer each query with the chat model
//!
//! Type `<stop>` to end the session.

use anyhow::{bail, Context, Result};
use clap::Parser;
use mmrag_core::{Embedder, EmbeddingConfig, RetrievalResult};
use mmrag_embed::{EmbedderPool, HashingEmbedder};
#[cfg(feature = "candle")]
use mmrag_embed::CandleEmbedder;
use mmrag_index::{build_retriever, IngestionProfile};
use mmrag_llm::{AnswerGenerator, OllamaChat, Summarizer};
use mmrag_query::{filter_by_threshold, MultiVectorRetriever, RetrieverConfig};
use mmrag_store::{DiversityConfig, MemoryContentStore, MemoryEmbeddingIndex};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod config;

use config::{Config, EmbeddingBackend};

const STOP_TOKEN: &str = "<stop>";

const NOTHING_FOUND: &str = "Did not find relevant documents for this query. Try to rephrase it.";

#[derive(Parser)]
#[command(name = "mmrag")]
#[command(about = "Multimodal retrieval and question answering over a PDF")]
#[command(version)]
struct Cli {
    /// Path to the PDF file
    filepath: PathBuf,

    /// 0: retrieval only, 1: answer questions
    #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
    mode: u8,

    /// Path to config file (default: ~/.config/mmrag/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Retrieval,
    Answer,
}

impl Mode {
    fn from_arg(mode: u8) -> Self {
        if mode == 0 {
            Self::Retrieval
        } else {
            Self::Answer
        }
    }

    fn profile(self) -> IngestionProfile {
        match self {
            Self::Retrieval => IngestionProfile::retrieval_only(),
            Self::Answer => IngestionProfile::answering(),
        }
    }

    fn intro(self) -> String {
        let action = match self {
            Self::Retrieval => "print relevant texts and images for it",
            Self::Answer => "get answer from the chatbot",
        };
        format!(
            "Ask a query about the input PDF to {action}.\nTo stop simply type {STOP_TOKEN}.\n"
        )
    }
}

fn log_level(cli: &Cli, config: &Config) -> Level {
    if cli.verbose {
        return Level::DEBUG;
    }
    config.logging.level.parse().unwrap_or(Level::INFO)
}

/// Create the embedder selected in the configuration, wrapped in a pool.
async fn create_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.embedding.backend {
        EmbeddingBackend::Hashing => Arc::new(
            HashingEmbedder::new(config.embedding.dimension)
                .context("Failed to create hashing embedder")?,
        ),
        #[cfg(feature = "candle")]
        EmbeddingBackend::Candle => {
            let cache_dir = config::data_dir()
                .context("Failed to get data directory")?
                .join("models");
            let embedder = CandleEmbedder::new(cache_dir);

            info!("Initializing embedder (this may download the model on first run)...");
            embedder
                .init()
                .await
                .context("Failed to initialize embedder")?;
            Arc::new(embedder)
        }
        #[cfg(not(feature = "candle"))]
        EmbeddingBackend::Candle => {
            bail!("The candle embedding backend requires building with --features candle")
        }
    };

    Ok(Arc::new(EmbedderPool::new(
        embedder,
        config.embedding.max_concurrent,
    )))
}

/// Create an empty retriever over in-memory stores.
async fn create_retriever(config: &Config) -> Result<MultiVectorRetriever> {
    let embedder = create_embedder(config).await?;
    let diversity = DiversityConfig {
        fetch_k: config.retrieval.fetch_k,
        lambda_mult: config.retrieval.lambda_mult,
    };
    let index = MemoryEmbeddingIndex::with_diversity(embedder, diversity)?.with_embedding_config(
        EmbeddingConfig {
            batch_size: config.embedding.batch_size,
            ..EmbeddingConfig::default()
        },
    );

    let retriever = MultiVectorRetriever::new(
        Arc::new(index),
        Arc::new(MemoryContentStore::new()),
        RetrieverConfig {
            top_k: config.retrieval.top_k,
            mode: config.retrieval.search_mode,
        },
    )?;
    Ok(retriever)
}

fn print_relevant(result: &RetrievalResult) {
    if result.is_empty() {
        println!("{NOTHING_FOUND}");
        return;
    }

    println!("Found this relevant texts and images :");
    for item in result {
        println!();
        println!("Similarity score {} for:", item.score);
        println!();
        println!("{}", item.payload.display_content());
        println!();
    }
}

/// Read the next query, or `None` at end of input or on the stop token.
async fn next_query<R>(lines: &mut tokio::io::Lines<R>) -> Result<Option<String>>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    print!("Query: ");
    std::io::stdout().flush().context("Failed to flush stdout")?;

    match lines.next_line().await.context("Failed to read query")? {
        Some(line) if !line.contains(STOP_TOKEN) => Ok(Some(line)),
        _ => Ok(None),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    // Logs go to stderr so the query prompt stays readable.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(&cli, &config))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    if !cli.filepath.is_file() {
        bail!("PDF file does not exist: {}", cli.filepath.display());
    }
    let mode = Mode::from_arg(cli.mode);
    info!("Starting {:?} session for {:?}", mode, cli.filepath);

    let chat = Arc::new(OllamaChat::new(config.llm.to_ollama())?);
    let summarizer = Summarizer::new(chat.clone()).with_max_concurrency(config.summary.max_concurrency);
    let retriever = create_retriever(&config).await?;

    let profile = mode.profile().with_image_dir(&config.extraction.image_dir);
    let extractor = profile.extractor()?;
    build_retriever(&cli.filepath, &profile, &extractor, &summarizer, &retriever)
        .await
        .with_context(|| format!("Failed to ingest {}", cli.filepath.display()))?;

    let threshold = config.retrieval.loose_threshold;
    let generator = AnswerGenerator::new(chat);
    let mut conversation = generator.start_conversation();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", mode.intro());
    while let Some(query) = next_query(&mut lines).await? {
        let result = match retriever.retrieve(&query).await {
            Ok(result) => filter_by_threshold(result, threshold),
            Err(e) => {
                println!("Error: {e}");
                continue;
            }
        };

        match mode {
            Mode::Retrieval => print_relevant(&result),
            Mode::Answer => match generator.answer(&conversation, &query, &result).await {
                Ok((next, answer)) => {
                    conversation = next;
                    println!("{answer}");
                }
                Err(e) => println!("Error: {e}"),
            },
        }
    }

    Ok(())
}

//! Configuration handling for mmrag.
//!
//! Settings are read from a TOML file. Every field has a default, so a
//! missing file or a partial file is valid.

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use mmrag_core::SearchMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Embedding configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chat backend configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Summarization configuration
    #[serde(default)]
    pub summary: SummaryConfig,

    /// Extraction configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Retrieval-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Items retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// `similarity` or `diverse`
    #[serde(default)]
    pub search_mode: SearchMode,

    /// Candidates considered by diverse search
    #[serde(default = "default_fetch_k")]
    pub fetch_k: usize,

    /// Relevance weight of diverse search, in `[0, 1]`
    #[serde(default = "default_lambda_mult")]
    pub lambda_mult: f32,

    /// Distance threshold used by the interactive loops
    #[serde(default = "default_loose_threshold")]
    pub loose_threshold: f32,

    /// Tighter distance threshold
    #[serde(default = "default_strict_threshold")]
    pub strict_threshold: f32,
}

fn default_top_k() -> usize {
    mmrag_query::RetrievalDefaults::TOP_K
}

fn default_fetch_k() -> usize {
    mmrag_store::DEFAULT_FETCH_K
}

fn default_lambda_mult() -> f32 {
    mmrag_store::DEFAULT_LAMBDA_MULT
}

fn default_loose_threshold() -> f32 {
    mmrag_query::RetrievalDefaults::LOOSE
}

fn default_strict_threshold() -> f32 {
    mmrag_query::RetrievalDefaults::STRICT
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            search_mode: SearchMode::default(),
            fetch_k: default_fetch_k(),
            lambda_mult: default_lambda_mult(),
            loose_threshold: default_loose_threshold(),
            strict_threshold: default_strict_threshold(),
        }
    }
}

/// Embedding backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Offline feature hashing
    #[default]
    Hashing,
    /// gte-small through candle (requires the `candle` feature)
    Candle,
}

/// Embedding-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Backend to use
    #[serde(default)]
    pub backend: EmbeddingBackend,

    /// Vector dimension of the hashing backend
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Batch size for embedding
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Max concurrent embedding jobs
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_dimension() -> usize {
    mmrag_embed::DEFAULT_DIMENSION
}

fn default_batch_size() -> usize {
    32
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            dimension: default_dimension(),
            batch_size: default_batch_size(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// Chat backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// Ollama base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Multimodal model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llava".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    pub fn to_ollama(&self) -> mmrag_llm::OllamaConfig {
        mmrag_llm::OllamaConfig {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Summarization configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryConfig {
    /// Max in-flight summary requests
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_max_concurrency() -> usize {
    mmrag_llm::DEFAULT_MAX_CONCURRENCY
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionConfig {
    /// Root directory for extracted figures
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("./resources/figs")
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// A missing default file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match config_dir().map(|dir| dir.join("config.toml")) {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Load and validate the TOML file at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the retriever or summarizer cannot work with.
    pub fn validate(&self) -> Result<()> {
        let retrieval = &self.retrieval;
        if retrieval.top_k == 0 {
            bail!("retrieval.top_k must be at least 1");
        }
        if retrieval.fetch_k < retrieval.top_k {
            bail!(
                "retrieval.fetch_k ({}) must not be smaller than retrieval.top_k ({})",
                retrieval.fetch_k,
                retrieval.top_k
            );
        }
        if !(0.0..=1.0).contains(&retrieval.lambda_mult) {
            bail!(
                "retrieval.lambda_mult must be within [0, 1], got {}",
                retrieval.lambda_mult
            );
        }
        if self.summary.max_concurrency == 0 {
            bail!("summary.max_concurrency must be at least 1");
        }
        if self.embedding.dimension == 0 {
            bail!("embedding.dimension must be at least 1");
        }
        Ok(())
    }
}

/// Get the XDG config directory for mmrag.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("MMRAG_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "mmrag").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the XDG data directory for mmrag.
#[cfg(feature = "candle")]
pub fn data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("MMRAG_DATA_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "mmrag").map(|dirs| dirs.data_dir().to_path_buf())
}

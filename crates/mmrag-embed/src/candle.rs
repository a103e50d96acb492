//! GTE-small embedder using Candle.
//!
//! Weights are fetched from the Hugging Face Hub into the configured cache
//! directory on first use, then kept in memory for the life of the embedder.

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::tokio::ApiBuilder, Repo, RepoType};
use mmrag_core::{EmbedError, Embedder, EmbeddingConfig, EmbeddingOutput};
use std::path::PathBuf;
use tokenizers::Tokenizer;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Model identifier on Hugging Face Hub.
const MODEL_ID: &str = "thenlper/gte-small";

/// Embedding dimension for gte-small.
const EMBEDDING_DIM: usize = 384;

/// Maximum sequence length.
const MAX_TOKENS: usize = 512;

struct LoadedModel {
    model: BertModel,
    tokenizer: Tokenizer,
}

fn inference<E: std::fmt::Display>(step: &'static str) -> impl Fn(E) -> EmbedError {
    move |e| EmbedError::Inference(format!("{step}: {e}"))
}

fn model_load<E: std::fmt::Display>(step: &'static str) -> impl Fn(E) -> EmbedError {
    move |e| EmbedError::ModelLoad(format!("{step}: {e}"))
}

/// Sentence embedder backed by a BERT model running on Candle.
pub struct CandleEmbedder {
    device: Device,
    cache_dir: PathBuf,
    loaded: OnceCell<LoadedModel>,
}

impl CandleEmbedder {
    /// Create an embedder that caches model files under `cache_dir`.
    pub fn new(cache_dir: PathBuf) -> Self {
        let device = Device::cuda_if_available(0).unwrap_or(Device::Cpu);
        info!("CandleEmbedder using device: {:?}", device);
        Self {
            device,
            cache_dir,
            loaded: OnceCell::new(),
        }
    }

    /// Download (if needed) and load the model.
    pub async fn init(&self) -> Result<(), EmbedError> {
        self.model().await.map(|_| ())
    }

    async fn model(&self) -> Result<&LoadedModel, EmbedError> {
        self.loaded.get_or_try_init(|| self.load()).await
    }

    async fn load(&self) -> Result<LoadedModel, EmbedError> {
        info!("Loading {} into {}", MODEL_ID, self.cache_dir.display());

        let api = ApiBuilder::new()
            .with_cache_dir(self.cache_dir.clone())
            .build()
            .map_err(|e| EmbedError::BackendUnavailable(format!("hub client: {e}")))?;
        let repo = api.repo(Repo::new(MODEL_ID.to_string(), RepoType::Model));

        let mut files = Vec::with_capacity(3);
        for name in ["tokenizer.json", "config.json", "model.safetensors"] {
            debug!("Fetching {}", name);
            let path = repo
                .get(name)
                .await
                .map_err(|e| EmbedError::BackendUnavailable(format!("download {name}: {e}")))?;
            files.push(path);
        }

        let tokenizer = Tokenizer::from_file(&files[0]).map_err(model_load("tokenizer"))?;
        let raw_config = tokio::fs::read_to_string(&files[1])
            .await
            .map_err(model_load("read config"))?;
        let config: Config = serde_json::from_str(&raw_config).map_err(model_load("parse config"))?;

        // SAFETY: the safetensors file comes from the hub cache and is only read.
        #[allow(unsafe_code)]
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[files[2].clone()], DType::F32, &self.device)
                .map_err(model_load("weights"))?
        };
        let model = BertModel::load(vb, &config).map_err(model_load("bert"))?;

        info!("{} ready", MODEL_ID);
        Ok(LoadedModel { model, tokenizer })
    }

    fn encode_batch(
        &self,
        loaded: &LoadedModel,
        texts: &[&str],
        normalize: bool,
    ) -> Result<Vec<EmbeddingOutput>, EmbedError> {
        let encodings = loaded
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(inference("tokenize"))?;

        let width = encodings
            .iter()
            .map(|e| e.len())
            .max()
            .unwrap_or(0)
            .min(MAX_TOKENS);

        let mut ids = Vec::with_capacity(texts.len() * width);
        let mut mask = Vec::with_capacity(texts.len() * width);
        let mut token_counts = Vec::with_capacity(texts.len());
        for encoding in &encodings {
            let tokens = &encoding.get_ids()[..encoding.len().min(width)];
            token_counts.push(tokens.len());
            ids.extend(tokens.iter().copied());
            mask.extend(std::iter::repeat(1u32).take(tokens.len()));
            let pad = width - tokens.len();
            ids.extend(std::iter::repeat(0u32).take(pad));
            mask.extend(std::iter::repeat(0u32).take(pad));
        }

        let shape = (texts.len(), width);
        let input_ids = Tensor::from_vec(ids, shape, &self.device).map_err(inference("input_ids"))?;
        let attention =
            Tensor::from_vec(mask, shape, &self.device).map_err(inference("attention_mask"))?;
        let token_types = input_ids.zeros_like().map_err(inference("token_type_ids"))?;

        let hidden = loaded
            .model
            .forward(&input_ids, &token_types, Some(&attention))
            .map_err(inference("forward"))?;

        // Mean over unmasked positions.
        let weights = attention
            .to_dtype(DType::F32)
            .and_then(|m| m.unsqueeze(2))
            .and_then(|m| m.broadcast_as(hidden.shape()))
            .map_err(inference("mask"))?;
        let summed = hidden
            .mul(&weights)
            .and_then(|t| t.sum(1))
            .map_err(inference("pool"))?;
        let counts = weights
            .sum(1)
            .and_then(|t| t.clamp(1e-9, f64::MAX))
            .map_err(inference("pool"))?;
        let mut pooled = summed.div(&counts).map_err(inference("pool"))?;

        if normalize {
            let norms = pooled
                .sqr()
                .and_then(|t| t.sum_keepdim(1))
                .and_then(|t| t.sqrt())
                .and_then(|t| t.clamp(1e-12, f64::MAX))
                .map_err(inference("normalize"))?;
            pooled = pooled.broadcast_div(&norms).map_err(inference("normalize"))?;
        }

        let rows: Vec<Vec<f32>> = pooled.to_vec2().map_err(inference("to_vec"))?;
        Ok(rows
            .into_iter()
            .zip(token_counts)
            .map(|(embedding, token_count)| EmbeddingOutput {
                embedding,
                token_count,
            })
            .collect())
    }
}

#[async_trait]
impl Embedder for CandleEmbedder {
    fn model_name(&self) -> &str {
        MODEL_ID
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    async fn embed_text(
        &self,
        texts: &[&str],
        config: &EmbeddingConfig,
    ) -> Result<Vec<EmbeddingOutput>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let loaded = self.model().await?;
        debug!(
            "Embedding {} texts with batch_size {}",
            texts.len(),
            config.batch_size
        );

        let mut outputs = Vec::with_capacity(texts.len());
        for batch in texts.chunks(config.batch_size.max(1)) {
            outputs.extend(self.encode_batch(loaded, batch, config.normalize)?);
        }
        Ok(outputs)
    }
}

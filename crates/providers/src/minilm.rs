//! Sentence embeddings with all-MiniLM-L6-v2, run locally via Candle.
//!
//! Weights, config and tokenizer are fetched from the Hugging Face hub
//! (cached automatically) and the BERT encoder runs on the CPU. Token
//! states are mean-pooled and L2-normalized, which is what the
//! sentence-transformers checkpoint was trained for.

use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use docia_core::Embedder;
use docia_core::error::EmbeddingError;
use hf_hub::api::sync::Api;
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};
use tracing::info;

/// Word pieces kept per text; longer inputs are truncated.
const MAX_SEQ_LEN: usize = 256;

pub struct MiniLmEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    name: String,
    dimension: usize,
}

impl MiniLmEmbedder {
    /// Download (if needed) and load a sentence-transformers BERT model.
    pub fn load(repo_id: &str) -> Result<Self, EmbeddingError> {
        let device = Device::Cpu;

        info!(repo = repo_id, "Downloading/loading embedding model");

        let api = Api::new().map_err(|e| {
            EmbeddingError::Network(format!("Failed to initialize HuggingFace Hub API: {e}"))
        })?;
        let repo = api.model(repo_id.to_string());

        let fetch = |file: &str| {
            repo.get(file).map_err(|e| {
                EmbeddingError::ModelNotFound(format!("Failed to fetch '{file}' from '{repo_id}': {e}"))
            })
        };
        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;

        let config_json = std::fs::read_to_string(&config_path)
            .map_err(|e| EmbeddingError::ModelNotFound(format!("Failed to read model config: {e}")))?;
        let config: BertConfig = serde_json::from_str(&config_json)
            .map_err(|e| EmbeddingError::ModelNotFound(format!("Invalid model config: {e}")))?;
        let dimension = hidden_size(&config_json)?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbeddingError::Tokenization(format!("Failed to load tokenizer: {e}")))?;
        tokenizer
            .with_padding(None::<PaddingParams>)
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::Tokenization(format!("Failed to configure tokenizer: {e}")))?;

        // SAFETY: the safetensors file is memory-mapped read-only and owned by
        // the hub cache for the lifetime of the process.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device) }
            .map_err(map_candle_err)?;
        let model = BertModel::load(vb, &config).map_err(map_candle_err)?;

        info!(
            repo = repo_id,
            dimension,
            "Embedding model loaded"
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            name: repo_id.to_string(),
            dimension,
        })
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::Tokenization(e.to_string()))?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(map_candle_err)?;
        let token_type_ids = input_ids.zeros_like().map_err(map_candle_err)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(map_candle_err)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(map_candle_err)?;

        // Single unpadded sequence: the masked mean is the plain mean.
        let pooled = hidden
            .mean(1)
            .and_then(|t| t.squeeze(0))
            .map_err(map_candle_err)?;
        let norm: f32 = pooled
            .sqr()
            .and_then(|t| t.sum_all())
            .and_then(|t| t.sqrt())
            .and_then(|t| t.to_scalar::<f32>())
            .map_err(map_candle_err)?;
        let normalized = if norm > 0.0 {
            pooled.affine(1.0 / norm as f64, 0.0).map_err(map_candle_err)?
        } else {
            pooled
        };

        normalized.to_vec1::<f32>().map_err(map_candle_err)
    }
}

impl Embedder for MiniLmEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.encode(text)
    }
}

/// The output width, read from the raw config (the typed config keeps it private).
fn hidden_size(config_json: &str) -> Result<usize, EmbeddingError> {
    let raw: serde_json::Value = serde_json::from_str(config_json)
        .map_err(|e| EmbeddingError::ModelNotFound(format!("Invalid model config: {e}")))?;
    raw["hidden_size"]
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| EmbeddingError::ModelNotFound("Model config has no hidden_size".into()))
}

fn map_candle_err(e: candle_core::Error) -> EmbeddingError {
    EmbeddingError::Inference(format!("Candle inference error: {e}"))
}

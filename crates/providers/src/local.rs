//! Local generation engine — runs the language model directly on your hardware.
//!
//! Uses [Candle](https://github.com/huggingface/candle) (Rust-native ML) to run
//! GGUF-quantized Llama-architecture models. Inference runs on the first CUDA
//! device when one is available and falls back to the CPU otherwise; the
//! device only changes latency, not the sampling behaviour.
//!
//! Supported presets:
//! - **mistral-7b** (default) — Mistral 7B base, Q4_K_M ~4.4 GB
//! - **mistral-7b-instruct** — Mistral 7B Instruct v0.2
//! - **tinyllama** (1.1B params, ~670 MB) — for small machines
//! - **smollm** (135M params) — smoke tests and CI machines
//!
//! A path to a `.gguf` file (with `tokenizer.json` next to it) also works.

use async_trait::async_trait;
use candle_core::quantized::gguf_file;
use candle_core::{Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::quantized_llama as qlm;
use docia_core::error::GenerationError;
use docia_core::{GenerationParams, Generator};
use hf_hub::api::sync::Api;
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A hub repository plus the GGUF file and tokenizer to pull from it.
struct ModelPreset {
    repo: &'static str,
    gguf_file: &'static str,
    tokenizer_repo: &'static str,
}

fn resolve_preset(alias: &str) -> Option<ModelPreset> {
    let alias_lower = alias.to_lowercase();
    match alias_lower.as_str() {
        "mistral" | "mistral-7b" | "mistral-7b-v0.1" => Some(ModelPreset {
            repo: "TheBloke/Mistral-7B-v0.1-GGUF",
            gguf_file: "mistral-7b-v0.1.Q4_K_M.gguf",
            tokenizer_repo: "mistralai/Mistral-7B-v0.1",
        }),
        "mistral-instruct" | "mistral-7b-instruct" => Some(ModelPreset {
            repo: "TheBloke/Mistral-7B-Instruct-v0.2-GGUF",
            gguf_file: "mistral-7b-instruct-v0.2.Q4_K_M.gguf",
            tokenizer_repo: "mistralai/Mistral-7B-Instruct-v0.2",
        }),
        "tinyllama" | "tiny-llama" | "tinyllama-1.1b" => Some(ModelPreset {
            repo: "TheBloke/TinyLlama-1.1B-Chat-v1.0-GGUF",
            gguf_file: "tinyllama-1.1b-chat-v1.0.Q4_K_M.gguf",
            tokenizer_repo: "TinyLlama/TinyLlama-1.1B-Chat-v1.0",
        }),
        "smollm" | "smollm:135m" | "smollm-135m" => Some(ModelPreset {
            repo: "TheBloke/SmolLM-135M-Instruct-GGUF",
            gguf_file: "smollm-135m-instruct.Q4_K_M.gguf",
            tokenizer_repo: "HuggingFaceTB/SmolLM-135M-Instruct",
        }),
        _ => None,
    }
}

// ── Local Generator ────────────────────────────────────────────────────

/// A generation engine that runs a GGUF-quantized model in-process.
///
/// The weights carry a KV cache, so inference is serialized behind a mutex.
pub struct LocalGenerator {
    inner: Arc<Mutex<LocalModelState>>,
    model_id: String,
}

/// The loaded model state (tokenizer + weights).
struct LocalModelState {
    model: qlm::ModelWeights,
    tokenizer: Tokenizer,
    device: Device,
    eos_token_id: u32,
}

impl LocalGenerator {
    /// Load a model by preset alias or `.gguf` path (downloads if needed).
    ///
    /// Blocking: call from a blocking thread when inside an async runtime.
    pub fn load(model_name: &str) -> Result<Self, GenerationError> {
        let state = LocalModelState::load(model_name)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(state)),
            model_id: model_name.to_string(),
        })
    }
}

impl LocalModelState {
    fn load(model_name: &str) -> Result<Self, GenerationError> {
        let device = Device::cuda_if_available(0).map_err(map_candle_err)?;
        info!(device = ?device, "Selected inference device");

        if Path::new(model_name).exists() && model_name.ends_with(".gguf") {
            return Self::load_from_path(Path::new(model_name), device);
        }

        let preset = resolve_preset(model_name).ok_or_else(|| {
            GenerationError::ModelNotFound(format!(
                "Unknown local model '{}'. Available presets: mistral-7b, mistral-7b-instruct, \
                 tinyllama, smollm. Or provide a path to a .gguf file.",
                model_name
            ))
        })?;

        info!(
            model = model_name,
            repo = preset.repo,
            file = preset.gguf_file,
            "Fetching generation weights"
        );

        let api = Api::new().map_err(|e| {
            GenerationError::Network(format!("Hugging Face hub unavailable: {e}"))
        })?;

        let model_path = api
            .model(preset.repo.to_string())
            .get(preset.gguf_file)
            .map_err(|e| {
                GenerationError::Network(format!(
                    "Could not fetch {} from {}: {e}",
                    preset.gguf_file, preset.repo
                ))
            })?;

        info!(path = %model_path.display(), "Generation weights cached");

        let tokenizer_path = api
            .model(preset.tokenizer_repo.to_string())
            .get("tokenizer.json")
            .map_err(|e| {
                GenerationError::Network(format!(
                    "Could not fetch tokenizer.json from {}: {e}",
                    preset.tokenizer_repo
                ))
            })?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| GenerationError::NotConfigured(format!("Failed to load tokenizer: {e}")))?;

        let model = read_weights(&model_path, &device)?;
        Ok(Self::assemble(model, tokenizer, device))
    }

    /// Load from an explicit GGUF file path; `tokenizer.json` must sit next to it.
    fn load_from_path(path: &Path, device: Device) -> Result<Self, GenerationError> {
        info!(path = %path.display(), "Loading GGUF weights from disk");

        let tokenizer_path = path.with_file_name("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            GenerationError::NotConfigured(format!(
                "Failed to load tokenizer at {}: {e}",
                tokenizer_path.display()
            ))
        })?;

        let model = read_weights(path, &device)?;
        Ok(Self::assemble(model, tokenizer, device))
    }

    fn assemble(model: qlm::ModelWeights, tokenizer: Tokenizer, device: Device) -> Self {
        let eos_token_id = tokenizer
            .token_to_id("</s>")
            .or_else(|| tokenizer.token_to_id("<|endoftext|>"))
            .or_else(|| tokenizer.token_to_id("<|im_end|>"))
            .unwrap_or(2);

        info!(eos_token_id, "Generation engine ready");

        Self {
            model,
            tokenizer,
            device,
            eos_token_id,
        }
    }

    /// Run inference: tokenize → sample tokens → decode.
    ///
    /// The decoded text covers the prompt followed by the continuation.
    fn generate(&mut self, prompt: &str, params: &GenerationParams) -> Result<String, GenerationError> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| GenerationError::Inference(format!("Tokenization failed: {e}")))?;

        let mut tokens: Vec<u32> = encoding.get_ids().to_vec();
        let prompt_len = tokens.len();

        debug!(
            prompt_tokens = prompt_len,
            max_new_tokens = params.max_new_tokens,
            temperature = params.temperature,
            top_p = params.top_p,
            "Starting local generation"
        );

        let mut logits_processor = if !params.do_sample || params.temperature <= 0.0 {
            LogitsProcessor::new(rand::random(), None, None)
        } else {
            LogitsProcessor::new(
                rand::random(),
                Some(f64::from(params.temperature)),
                Some(f64::from(params.top_p)),
            )
        };

        for step in 0..params.max_new_tokens as usize {
            // First step feeds the whole prompt; later steps feed only the
            // newest token and rely on the KV cache.
            let (input, index_pos) = if step == 0 {
                (&tokens[..], 0)
            } else {
                (&tokens[tokens.len() - 1..], tokens.len() - 1)
            };

            let input = Tensor::new(input, &self.device)
                .and_then(|t| t.unsqueeze(0))
                .map_err(map_candle_err)?;
            let logits = self
                .model
                .forward(&input, index_pos)
                .and_then(|t| t.squeeze(0))
                .map_err(map_candle_err)?;

            let logits = if (params.repetition_penalty - 1.0).abs() < f32::EPSILON {
                logits
            } else {
                candle_transformers::utils::apply_repeat_penalty(
                    &logits,
                    params.repetition_penalty,
                    &tokens,
                )
                .map_err(map_candle_err)?
            };

            let next_token = logits_processor.sample(&logits).map_err(map_candle_err)?;
            if next_token == self.eos_token_id {
                break;
            }
            tokens.push(next_token);
        }

        let output = self
            .tokenizer
            .decode(&tokens, true)
            .map_err(|e| GenerationError::Inference(format!("Detokenization failed: {e}")))?;

        debug!(
            completion_tokens = tokens.len() - prompt_len,
            output_len = output.len(),
            "Generation complete"
        );

        Ok(output)
    }
}

fn read_weights(path: &Path, device: &Device) -> Result<qlm::ModelWeights, GenerationError> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| GenerationError::NotConfigured(format!("Cannot open GGUF file: {e}")))?;

    let gguf = gguf_file::Content::read(&mut file)
        .map_err(|e| GenerationError::NotConfigured(format!("Malformed GGUF file: {e}")))?;

    qlm::ModelWeights::from_gguf(gguf, &mut file, device)
        .map_err(|e| GenerationError::NotConfigured(format!("Cannot build llama weights: {e}")))
}

/// Map Candle errors to GenerationError.
fn map_candle_err(e: candle_core::Error) -> GenerationError {
    GenerationError::Inference(format!("Candle inference error: {e}"))
}

// ── Generator trait implementation ─────────────────────────────────────

#[async_trait]
impl Generator for LocalGenerator {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        let inner = self.inner.clone();
        let prompt = prompt.to_string();
        let params = params.clone();

        // Candle inference is CPU/GPU-bound; keep it off the async workers.
        tokio::task::spawn_blocking(move || {
            let mut state = inner.blocking_lock();
            state.generate(&prompt, &params)
        })
        .await
        .map_err(|e| GenerationError::Inference(format!("Generation task aborted: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_preset_aliases() {
        assert!(resolve_preset("mistral-7b").is_some());
        assert!(resolve_preset("Mistral").is_some());
        assert!(resolve_preset("tinyllama").is_some());
        assert!(resolve_preset("smollm:135m").is_some());
        assert!(resolve_preset("nonexistent").is_none());
    }

    #[test]
    fn default_preset_points_at_mistral() {
        let preset = resolve_preset("mistral-7b").unwrap();
        assert!(preset.repo.contains("Mistral-7B"));
        assert!(preset.gguf_file.ends_with(".gguf"));
        assert_eq!(preset.tokenizer_repo, "mistralai/Mistral-7B-v0.1");
    }

    #[test]
    fn unknown_model_fails_to_load() {
        let err = LocalGenerator::load("definitely-not-a-model").err().unwrap();
        assert!(matches!(err, GenerationError::ModelNotFound(_)));
    }
}

//! Generator trait — the abstraction over causal language models.
//!
//! A Generator takes a fully composed prompt and returns the model's raw
//! text. Post-processing (answer extraction) is the caller's job.
//!
//! Implementations: Candle GGUF (local), Mistral-compatible HTTP endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Sampling controls for a generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Maximum number of tokens to generate after the prompt
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,

    /// Temperature (0.0 = greedy, higher = more varied)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling cutoff
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Penalty applied to logits of already generated tokens (1.0 = off)
    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f32,

    /// Sample from the distribution instead of taking the argmax
    #[serde(default = "default_do_sample")]
    pub do_sample: bool,
}

fn default_max_new_tokens() -> u32 {
    150
}
fn default_temperature() -> f32 {
    0.3
}
fn default_top_p() -> f32 {
    0.9
}
fn default_repetition_penalty() -> f32 {
    1.1
}
fn default_do_sample() -> bool {
    true
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            repetition_penalty: default_repetition_penalty(),
            do_sample: default_do_sample(),
        }
    }
}

/// The core Generator trait.
///
/// Every language-model backend implements this trait. The assistant calls
/// `generate()` without knowing which backend is in use.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Identifier of the loaded model (reported by the health endpoint).
    fn model_id(&self) -> &str;

    /// Produce a continuation for `prompt`.
    ///
    /// Sampling is enabled by default, so repeated calls with the same
    /// prompt may return different text.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError>;
}

//! Construct the configured encoder and generation engine.

use docia_config::{EmbeddingBackend, EmbeddingConfig, GenerationBackend, GenerationConfig};
use docia_core::error::{EmbeddingError, GenerationError};
use docia_core::{Embedder, Generator};
use std::sync::Arc;
use tracing::info;

use crate::hash::HashEmbedder;
use crate::remote::RemoteGenerator;

/// Hosted model used when the config still names the local default preset.
pub const DEFAULT_REMOTE_MODEL: &str = "mistral-large-latest";

/// Build the encoder. Blocking when the MiniLM weights need downloading.
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    match config.backend {
        EmbeddingBackend::Hash => {
            info!(dimension = config.hash_dimension, "Using feature-hashing encoder");
            Ok(Arc::new(HashEmbedder::new(config.hash_dimension)))
        }
        EmbeddingBackend::Minilm => build_minilm(&config.model),
    }
}

#[cfg(feature = "local")]
fn build_minilm(model: &str) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    Ok(Arc::new(crate::minilm::MiniLmEmbedder::load(model)?))
}

#[cfg(not(feature = "local"))]
fn build_minilm(model: &str) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    Err(EmbeddingError::NotConfigured(format!(
        "Encoder '{model}' needs the `local` feature; rebuild with --features local \
         or set embedding.backend = \"hash\""
    )))
}

/// Build the generation engine.
///
/// `Ok(None)` means generation is disabled on purpose. Errors are load
/// failures; callers treat them as "no engine" rather than aborting.
pub fn build_generator(
    config: &GenerationConfig,
) -> Result<Option<Arc<dyn Generator>>, GenerationError> {
    match config.backend {
        GenerationBackend::None => {
            info!("Generation disabled by configuration");
            Ok(None)
        }
        GenerationBackend::Remote => {
            let api_key = config.api_key.clone().unwrap_or_default();
            let model = remote_model(&config.model);
            info!(url = %config.api_url, model, "Using remote generation endpoint");
            let remote = RemoteGenerator::new(&config.api_url, api_key, model)?;
            Ok(Some(Arc::new(remote)))
        }
        GenerationBackend::Local => build_local(&config.model).map(Some),
    }
}

fn remote_model(configured: &str) -> &str {
    if configured == "mistral-7b" {
        DEFAULT_REMOTE_MODEL
    } else {
        configured
    }
}

#[cfg(feature = "local")]
fn build_local(model: &str) -> Result<Arc<dyn Generator>, GenerationError> {
    Ok(Arc::new(crate::local::LocalGenerator::load(model)?))
}

#[cfg(not(feature = "local"))]
fn build_local(model: &str) -> Result<Arc<dyn Generator>, GenerationError> {
    Err(GenerationError::NotConfigured(format!(
        "Local model '{model}' needs the `local` feature; rebuild with --features local \
         or set generation.backend = \"remote\""
    )))
}

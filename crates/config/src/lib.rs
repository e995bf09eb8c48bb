//! Configuration loading, validation, and management for DocIA.
//!
//! Loads configuration from `~/.docia/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use docia_core::{GenerationParams, Language};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.docia/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language used when a request does not specify one
    #[serde(default)]
    pub default_language: Language,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Knowledge base location
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Context retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Embedding encoder settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Generation engine settings
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Allowed CORS origins. `["*"]` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Path to the JSON knowledge base
    #[serde(default = "default_knowledge_path")]
    pub path: PathBuf,
}

fn default_knowledge_path() -> PathBuf {
    PathBuf::from("medical_kb.json")
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: default_knowledge_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// A best match must score strictly above this to be used as context
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Encode every knowledge-base candidate once at startup instead of on
    /// every request
    #[serde(default)]
    pub precompute_embeddings: bool,
}

fn default_threshold() -> f32 {
    0.5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            precompute_embeddings: false,
        }
    }
}

/// Which embedding encoder to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Sentence-transformers MiniLM via Candle (requires the `local` feature)
    Minilm,
    /// Feature-hashing bag of words (offline, no model download)
    Hash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_backend")]
    pub backend: EmbeddingBackend,

    /// Hugging Face repository of the sentence-transformers model
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector length for the hashing encoder
    #[serde(default = "default_hash_dimension")]
    pub hash_dimension: usize,
}

fn default_embedding_backend() -> EmbeddingBackend {
    EmbeddingBackend::Minilm
}
fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".into()
}
fn default_hash_dimension() -> usize {
    384
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_embedding_backend(),
            model: default_embedding_model(),
            hash_dimension: default_hash_dimension(),
        }
    }
}

/// Which generation engine to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationBackend {
    /// GGUF model run in-process via Candle (requires the `local` feature)
    Local,
    /// Mistral-compatible chat completions endpoint
    Remote,
    /// No generation engine; every question gets the unavailable message
    None,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_backend")]
    pub backend: GenerationBackend,

    /// Model preset, GGUF path (local) or model name (remote)
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Base URL of the remote endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key for the remote endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Append the fixed safety disclaimer to generated answers as well.
    /// Off by default: generated answers rely on the prompt's own rule.
    #[serde(default)]
    pub append_disclaimer: bool,

    /// Sampling controls
    #[serde(default)]
    pub sampling: GenerationParams,
}

fn default_generation_backend() -> GenerationBackend {
    GenerationBackend::Local
}
fn default_generation_model() -> String {
    "mistral-7b".into()
}
fn default_api_url() -> String {
    "https://api.mistral.ai/v1".into()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: default_generation_backend(),
            model: default_generation_model(),
            api_url: default_api_url(),
            api_key: None,
            append_disclaimer: false,
            sampling: GenerationParams::default(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("sampling", &self.sampling)
            .field("append_disclaimer", &self.append_disclaimer)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.docia/config.toml).
    ///
    /// Environment variables override file values:
    /// - `DOCIA_KNOWLEDGE_PATH`
    /// - `DOCIA_MODEL`
    /// - `DOCIA_GENERATION_BACKEND` (`local`, `remote`, `none`)
    /// - `MISTRAL_API_KEY` (only if no key is configured)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("DOCIA_KNOWLEDGE_PATH") {
            self.knowledge.path = PathBuf::from(path);
        }

        if let Some(model) = lookup("DOCIA_MODEL") {
            self.generation.model = model;
        }

        if let Some(backend) = lookup("DOCIA_GENERATION_BACKEND") {
            self.generation.backend = match backend.to_ascii_lowercase().as_str() {
                "local" => GenerationBackend::Local,
                "remote" => GenerationBackend::Remote,
                "none" => GenerationBackend::None,
                other => {
                    return Err(ConfigError::ValidationError(format!(
                        "DOCIA_GENERATION_BACKEND must be local, remote or none (got '{other}')"
                    )));
                }
            };
        }

        if self.generation.api_key.is_none() {
            self.generation.api_key = lookup("MISTRAL_API_KEY");
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".docia")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(-1.0..=1.0).contains(&self.retrieval.threshold) {
            return Err(ConfigError::ValidationError(
                "retrieval.threshold must be between -1.0 and 1.0".into(),
            ));
        }

        let sampling = &self.generation.sampling;
        if sampling.temperature < 0.0 || sampling.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "generation.sampling.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if sampling.top_p <= 0.0 || sampling.top_p > 1.0 {
            return Err(ConfigError::ValidationError(
                "generation.sampling.top_p must be in (0.0, 1.0]".into(),
            ));
        }

        if sampling.repetition_penalty <= 0.0 {
            return Err(ConfigError::ValidationError(
                "generation.sampling.repetition_penalty must be > 0".into(),
            ));
        }

        if sampling.max_new_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "generation.sampling.max_new_tokens must be > 0".into(),
            ));
        }

        if self.embedding.backend == EmbeddingBackend::Hash && self.embedding.hash_dimension < 8 {
            return Err(ConfigError::ValidationError(
                "embedding.hash_dimension must be at least 8".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `docia config`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for docia_core::Error {
    fn from(e: ConfigError) -> Self {
        docia_core::Error::Config {
            message: e.to_string(),
        }
    }
}

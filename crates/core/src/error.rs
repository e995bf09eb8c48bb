//! Error types for the DocIA domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all DocIA operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Client input ---
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // --- Knowledge base errors ---
    #[error("Knowledge base error: {0}")]
    Knowledge(#[from] KnowledgeError),

    // --- Embedding errors ---
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    // --- Generation errors ---
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error was caused by the caller's input rather than by
    /// the service itself.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

// --- Bounded context errors ---

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Failed to read knowledge base at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse knowledge base: {0}")]
    Parse(String),

    #[error("Unsupported value for {condition}/{attribute}: {reason}")]
    InvalidValue {
        condition: String,
        attribute: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    #[error("Embedding model not found: {0}")]
    ModelNotFound(String),

    #[error("Embedding backend not configured: {0}")]
    NotConfigured(String),

    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    #[error("Embedding inference failed: {0}")]
    Inference(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Generation model not found: {0}")]
    ModelNotFound(String),

    #[error("Generation backend not configured: {0}")]
    NotConfigured(String),

    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Model inference failed: {0}")]
    Inference(String),

    #[error("Network error: {0}")]
    Network(String),
}

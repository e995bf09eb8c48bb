//! Embedder trait — the abstraction over text-embedding models.
//!
//! An Embedder turns arbitrary text into a fixed-length vector so that
//! knowledge-base candidates can be ranked against a query by cosine
//! similarity.
//!
//! Implementations: Candle MiniLM (local), feature hashing (offline/tests).

use crate::error::EmbeddingError;

/// The core Embedder trait.
///
/// Encoding is CPU-bound and synchronous; async callers should run it on a
/// blocking thread.
pub trait Embedder: Send + Sync {
    /// A human-readable name for this encoder (e.g., "all-MiniLM-L6-v2").
    fn name(&self) -> &str;

    /// Length of every vector this encoder produces.
    fn dimension(&self) -> usize;

    /// Encode one text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

impl<E: Embedder + ?Sized> Embedder for std::sync::Arc<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text)
    }
}

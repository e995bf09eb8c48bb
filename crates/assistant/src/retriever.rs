//! Context retrieval — pick the single knowledge-base text closest to a query.
//!
//! The scan is linear: every attribute of every condition written in the
//! requested language is a candidate. Candidates are compared against the
//! query embedding by cosine similarity and the first-seen maximum wins.
//! A winner is only used when its score is strictly above the threshold.

use docia_core::error::EmbeddingError;
use docia_core::{Embedder, KnowledgeBase, Language};
use std::sync::Arc;
use tracing::debug;

/// Returned in place of a context when nothing relevant was found.
pub const NO_CONTEXT: &str = "No specific context found.";

/// Minimum score a candidate must exceed to be used.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if the lengths differ or either vector is empty or zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// The best candidate of a scan, before the threshold is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    /// Flattened text of the winning attribute (empty if nothing was scanned)
    pub best_context: String,
    /// Cosine similarity of the winner; -1 if nothing was scanned
    pub best_score: f32,
    pub condition: Option<String>,
    pub attribute: Option<String>,
}

impl RetrievalResult {
    fn empty() -> Self {
        Self {
            best_context: String::new(),
            best_score: -1.0,
            condition: None,
            attribute: None,
        }
    }

    /// Whether the winner is good enough to be used as context.
    pub fn is_relevant(&self, threshold: f32) -> bool {
        self.best_score > threshold
    }

    /// The winning text, or [`NO_CONTEXT`] when it does not clear the threshold.
    pub fn into_context(self, threshold: f32) -> String {
        if self.is_relevant(threshold) {
            self.best_context
        } else {
            NO_CONTEXT.to_string()
        }
    }

    fn offer(&mut self, score: f32, condition: &str, attribute: &str, text: &str) {
        if score > self.best_score {
            self.best_score = score;
            self.best_context = text.to_string();
            self.condition = Some(condition.to_string());
            self.attribute = Some(attribute.to_string());
        }
    }
}

/// A candidate whose embedding was computed ahead of time.
struct IndexedCandidate {
    language: Language,
    condition: String,
    attribute: String,
    text: String,
    embedding: Vec<f32>,
}

/// Finds the most relevant knowledge-base text for a question.
pub struct Retriever {
    knowledge: Arc<KnowledgeBase>,
    embedder: Arc<dyn Embedder>,
    threshold: f32,
    index: Option<Vec<IndexedCandidate>>,
}

impl Retriever {
    pub fn new(knowledge: Arc<KnowledgeBase>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            knowledge,
            embedder,
            threshold: DEFAULT_THRESHOLD,
            index: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Encode every candidate once so queries only encode the question.
    ///
    /// Scores are the same as the per-request scan.
    pub fn precompute(mut self) -> Result<Self, EmbeddingError> {
        let mut index = Vec::new();
        for language in Language::ALL {
            for candidate in self.knowledge.candidates(language) {
                let embedding = self.embedder.embed(&candidate.text)?;
                index.push(IndexedCandidate {
                    language,
                    condition: candidate.condition.to_string(),
                    attribute: candidate.attribute.to_string(),
                    text: candidate.text,
                    embedding,
                });
            }
        }
        debug!(candidates = index.len(), "Precomputed knowledge base embeddings");
        self.index = Some(index);
        Ok(self)
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_precomputed(&self) -> bool {
        self.index.is_some()
    }

    /// Context string for a question: the best text, or [`NO_CONTEXT`].
    pub fn retrieve(&self, query: &str, language: Language) -> Result<String, EmbeddingError> {
        Ok(self.retrieve_scored(query, language)?.into_context(self.threshold))
    }

    /// Full scan result, threshold not applied.
    pub fn retrieve_scored(
        &self,
        query: &str,
        language: Language,
    ) -> Result<RetrievalResult, EmbeddingError> {
        let query_embedding = self.embedder.embed(query)?;
        let mut best = RetrievalResult::empty();

        match &self.index {
            Some(index) => {
                for c in index.iter().filter(|c| c.language == language) {
                    let score = cosine_similarity(&query_embedding, &c.embedding);
                    best.offer(score, &c.condition, &c.attribute, &c.text);
                }
            }
            None => {
                for c in self.knowledge.candidates(language) {
                    let embedding = self.embedder.embed(&c.text)?;
                    let score = cosine_similarity(&query_embedding, &embedding);
                    best.offer(score, c.condition, c.attribute, &c.text);
                }
            }
        }

        debug!(
            language = %language,
            score = best.best_score,
            condition = best.condition.as_deref().unwrap_or("-"),
            attribute = best.attribute.as_deref().unwrap_or("-"),
            relevant = best.is_relevant(self.threshold),
            "Retrieval finished"
        );

        Ok(best)
    }
}

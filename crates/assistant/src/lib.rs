//! The DocIA answering pipeline.
//!
//! A question flows through four stages:
//!
//! 1. **Retrieve** the knowledge-base text closest to the question
//!    ([`Retriever`], cosine similarity over embeddings)
//! 2. **Compose** a constrained instruction prompt ([`prompt::compose`])
//! 3. **Generate** a continuation with the configured engine
//! 4. **Sanitize** the raw output down to the answer ([`sanitizer::sanitize`])
//!
//! [`KeywordMatcher`] is the non-generative fallback used by `/chat`.

pub mod assistant;
pub mod keyword;
pub mod messages;
pub mod prompt;
pub mod retriever;
pub mod sanitizer;

pub use assistant::{Assistant, ModelStatus};
pub use keyword::{KeywordCategory, KeywordMatcher};
pub use retriever::{NO_CONTEXT, RetrievalResult, Retriever, cosine_similarity};
pub use sanitizer::sanitize;

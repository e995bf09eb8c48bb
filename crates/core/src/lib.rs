//! # DocIA Core
//!
//! Domain types, traits, and error definitions for the DocIA medical
//! question-answering assistant. This crate has **no framework
//! dependencies** — it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! The two model collaborators (the embedding encoder and the generation
//! engine) are defined as traits here. Implementations live in
//! `docia-providers`. This enables:
//! - Swapping backends via configuration
//! - Deterministic testing with mock collaborators
//! - Clean dependency graph (all crates depend inward on core)

pub mod embedding;
pub mod error;
pub mod generation;
pub mod knowledge;
pub mod language;
pub mod query;

// Re-export key types at crate root for ergonomics
pub use embedding::Embedder;
pub use error::Error;
pub use generation::{GenerationParams, Generator};
pub use knowledge::{AttributeValue, Candidate, KnowledgeBase, KnowledgeEntry};
pub use language::Language;
pub use query::QueryRequest;

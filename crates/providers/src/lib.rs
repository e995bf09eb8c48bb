//! Embedding and generation backends for DocIA.
//!
//! Encoders implement `docia_core::Embedder`; generation engines implement
//! `docia_core::Generator`. The builder selects them from configuration.

pub mod builder;
pub mod hash;
#[cfg(feature = "local")]
pub mod local;
#[cfg(feature = "local")]
pub mod minilm;
pub mod remote;

pub use builder::{build_embedder, build_generator};
pub use hash::HashEmbedder;
#[cfg(feature = "local")]
pub use local::LocalGenerator;
#[cfg(feature = "local")]
pub use minilm::MiniLmEmbedder;
pub use remote::RemoteGenerator;

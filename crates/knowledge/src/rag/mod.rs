//! RAG (Retrieval-Augmented Generation) answering.
//!
//! Embeds the latest question, retrieves matching passages and streams a
//! grounded answer from the chat model.

pub mod pipeline;

pub use pipeline::{RagOutcome, RagPipeline};

/// Shown while the embedding model is still loading.
pub const WARMING_UP_MESSAGE: &str = "O sistema está carregando. Tente novamente.";

//! Passage store abstraction.
//!
//! Defines a trait for similarity search over stored passages, with a
//! Postgres/pgvector backend for production and an in-memory backend for
//! tests and local runs.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryPassageStore;
pub use postgres::PgPassageStore;

use crate::types::{Embedding, RetrievedPassage, StoreStats};
use docchat_core::config::RetrievalConfig;
use docchat_core::{AppError, AppResult};

/// Filter and size of a similarity search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    /// Minimum similarity, exclusive
    pub threshold: f32,

    /// Maximum number of passages returned
    pub limit: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::from(&RetrievalConfig::default())
    }
}

impl From<&RetrievalConfig> for SearchParams {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            threshold: config.threshold,
            limit: config.limit,
        }
    }
}

/// Reject a query no backend can score: wrong length, or zero norm.
///
/// Cosine distance against a zero vector is undefined (pgvector yields NaN),
/// so such a query never reaches a store.
pub(crate) fn check_query(query: &Embedding, dimensions: usize) -> AppResult<()> {
    if query.dimensions() != dimensions {
        return Err(AppError::DimensionMismatch {
            expected: dimensions,
            actual: query.dimensions(),
        });
    }

    if query.is_zero_norm() {
        return Err(AppError::Embedding(
            "Query embedding has zero norm".to_string(),
        ));
    }

    Ok(())
}

/// Trait for passage store backends.
///
/// Implementations must:
/// - Return only passages with similarity strictly above the threshold
/// - Order by descending similarity, ties by insertion order
/// - Return at most `limit` passages
#[async_trait::async_trait]
pub trait PassageStore: Send + Sync + std::fmt::Debug {
    /// Backend name (e.g., "postgres")
    fn backend_name(&self) -> &str;

    /// Search for the passages most similar to the query embedding.
    ///
    /// An empty result means nothing relevant was found and is not an error.
    ///
    /// # Errors
    /// `AppError::Search` when the store cannot be queried,
    /// `AppError::DimensionMismatch` when the query has the wrong length,
    /// `AppError::Embedding` when it has zero norm.
    async fn search(
        &self,
        query: &Embedding,
        params: &SearchParams,
    ) -> AppResult<Vec<RetrievedPassage>>;

    /// Get statistics about the store.
    async fn stats(&self) -> AppResult<StoreStats>;
}

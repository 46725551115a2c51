//! In-memory passage store.
//!
//! Exact scan over every passage. Used in tests and for small local corpora.

use super::{check_query, PassageStore, SearchParams};
use crate::similarity::rank;
use crate::types::{Embedding, Passage, RetrievedPassage, StoreStats};
use docchat_core::{AppError, AppResult};

/// Passage store held entirely in memory.
///
/// Built up front, then shared read-only.
#[derive(Debug, Clone)]
pub struct InMemoryPassageStore {
    dimensions: usize,
    documents: u64,
    passages: Vec<Passage>,
}

impl InMemoryPassageStore {
    /// Create an empty store for vectors of the given dimension.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            documents: 0,
            passages: Vec::new(),
        }
    }

    /// Add a document made of the given passages, keeping their order.
    pub fn add_document(&mut self, passages: impl IntoIterator<Item = Passage>) -> AppResult<()> {
        let passages: Vec<Passage> = passages.into_iter().collect();

        for passage in &passages {
            if passage.embedding.dimensions() != self.dimensions {
                return Err(AppError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: passage.embedding.dimensions(),
                });
            }
        }

        self.documents += 1;
        self.passages.extend(passages);
        Ok(())
    }

    /// Build a store holding one document.
    pub fn from_passages(
        dimensions: usize,
        passages: impl IntoIterator<Item = Passage>,
    ) -> AppResult<Self> {
        let mut store = Self::new(dimensions);
        store.add_document(passages)?;
        Ok(store)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

#[async_trait::async_trait]
impl PassageStore for InMemoryPassageStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn search(
        &self,
        query: &Embedding,
        params: &SearchParams,
    ) -> AppResult<Vec<RetrievedPassage>> {
        check_query(query, self.dimensions)?;

        let scored = self
            .passages
            .iter()
            .map(|passage| {
                Ok(RetrievedPassage {
                    content: passage.content.clone(),
                    similarity: query.cosine_similarity(&passage.embedding)?,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let results = rank(scored, params.threshold, params.limit);

        tracing::debug!(
            "Retrieved {} passage(s) of {} (threshold {}, limit {})",
            results.len(),
            self.passages.len(),
            params.threshold,
            params.limit
        );

        Ok(results)
    }

    async fn stats(&self) -> AppResult<StoreStats> {
        Ok(StoreStats {
            documents: self.documents,
            passages: self.passages.len() as u64,
        })
    }
}

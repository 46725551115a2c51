//! Postgres passage store backed by pgvector.
//!
//! Reads the `embeddings` table populated by the ingestion pipeline:
//!
//! ```sql
//! CREATE TABLE resources (id serial PRIMARY KEY, content text NOT NULL, ...);
//! CREATE TABLE embeddings (
//!     id serial PRIMARY KEY,
//!     resource_id serial REFERENCES resources(id) ON DELETE CASCADE,
//!     content text NOT NULL,
//!     embedding vector(768) NOT NULL
//! );
//! CREATE INDEX embedding_index ON embeddings USING hnsw (embedding vector_cosine_ops);
//! ```
//!
//! `<=>` is pgvector's cosine distance, so similarity is `1 - distance`.
//! Ordering by the raw distance lets the HNSW index serve the query, and
//! `id ASC` breaks ties in insertion order. A stored zero vector has a NaN
//! distance, which Postgres sorts above every number, so those rows are
//! excluded explicitly.

use super::{check_query, PassageStore, SearchParams};
use crate::types::{Embedding, RetrievedPassage, StoreStats};
use docchat_core::config::DatabaseConfig;
use docchat_core::{AppError, AppResult};
use pgvector::Vector;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::{debug, info, instrument};

const SEARCH_SQL: &str = r#"
    SELECT content, 1 - (embedding <=> $1) AS similarity
    FROM embeddings
    WHERE (embedding <=> $1) <> 'NaN'::float8
      AND 1 - (embedding <=> $1) > $2
    ORDER BY embedding <=> $1 ASC, id ASC
    LIMIT $3
"#;

const STATS_SQL: &str = r#"
    SELECT
        (SELECT COUNT(*) FROM resources) AS documents,
        (SELECT COUNT(*) FROM embeddings) AS passages
"#;

/// Passage store over a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgPassageStore {
    pool: PgPool,
    dimensions: usize,
}

impl PgPassageStore {
    /// Connect to the configured database.
    #[instrument(skip(config), fields(max_connections = config.max_connections))]
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        if config.url.is_empty() {
            return Err(AppError::Config(
                "Database URL is not set (DATABASE_URL or database.url)".to_string(),
            ));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| AppError::Search(format!("Failed to connect to Postgres: {}", e)))?;

        info!("Connected to passage store");

        Ok(Self::from_pool(pool, config.dimensions))
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool, dimensions: usize) -> Self {
        Self { pool, dimensions }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[async_trait::async_trait]
impl PassageStore for PgPassageStore {
    fn backend_name(&self) -> &str {
        "postgres"
    }

    #[instrument(skip(self, query), fields(threshold = params.threshold, limit = params.limit))]
    async fn search(
        &self,
        query: &Embedding,
        params: &SearchParams,
    ) -> AppResult<Vec<RetrievedPassage>> {
        check_query(query, self.dimensions)?;

        let vector = Vector::from(query.as_slice().to_vec());
        let limit = i64::try_from(params.limit).unwrap_or(i64::MAX);

        let rows = sqlx::query(SEARCH_SQL)
            .bind(vector)
            .bind(f64::from(params.threshold))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Search(format!("Similarity query failed: {}", e)))?;

        let results = rows
            .iter()
            .map(|row| {
                let content: String = row
                    .try_get("content")
                    .map_err(|e| AppError::Search(format!("Invalid passage row: {}", e)))?;
                let similarity: f64 = row
                    .try_get("similarity")
                    .map_err(|e| AppError::Search(format!("Invalid passage row: {}", e)))?;

                Ok(RetrievedPassage {
                    content,
                    similarity: similarity as f32,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        debug!("Retrieved {} passage(s)", results.len());

        Ok(results)
    }

    async fn stats(&self) -> AppResult<StoreStats> {
        let row = sqlx::query(STATS_SQL)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Search(format!("Failed to count passages: {}", e)))?;

        let documents: i64 = row
            .try_get("documents")
            .map_err(|e| AppError::Search(format!("Invalid stats row: {}", e)))?;
        let passages: i64 = row
            .try_get("passages")
            .map_err(|e| AppError::Search(format!("Invalid stats row: {}", e)))?;

        Ok(StoreStats {
            documents: documents.max(0) as u64,
            passages: passages.max(0) as u64,
        })
    }
}

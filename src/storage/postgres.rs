//! Relational backend.
//!
//! Only the connection and its startup liveness check exist. Document
//! operations report [`Error::NotImplemented`] instead of inventing results;
//! the intended behaviour is embed, insert vector and metadata in one
//! transaction, and make the row visible to the next search.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::document::Document;
use crate::error::{Error, Result};

use super::{BackendMode, DocumentStore, SearchResult};

const BACKEND: &str = "relational";

/// Postgres-backed store
pub struct PostgresStore {
    // Kept open for the lifetime of the store; no operation queries it yet
    #[allow(dead_code)]
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and run `SELECT 1`; any failure is returned to the caller
    pub async fn connect(database_url: &str, connect_timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(connect_timeout)
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    fn mode(&self) -> BackendMode {
        BackendMode::Relational
    }

    async fn upsert(&self, document: &Document, _embedding: &[f32]) -> Result<()> {
        tracing::warn!(doc_id = %document.doc_id, "Relational ingestion is not implemented");
        Err(Error::not_implemented(BACKEND, "add_document"))
    }

    async fn search(&self, _query_embedding: &[f32], _limit: usize) -> Result<Vec<SearchResult>> {
        Err(Error::not_implemented(BACKEND, "search_context"))
    }

    async fn count(&self) -> Result<usize> {
        Err(Error::not_implemented(BACKEND, "document_count"))
    }
}

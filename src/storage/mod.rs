//! Storage backends for dayplan
//!
//! Every backend implements [`DocumentStore`]; embedding happens before a
//! call reaches the backend, so all of them receive ready-made vectors.

mod embedded;
mod memory;
mod postgres;
mod sqlite;
pub mod vector;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::Result;

pub use embedded::EmbeddedStore;
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use sqlite::SqliteStorage;
pub use vector::VectorStorage;

/// Which kind of backend is serving the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Local on-disk index
    Embedded,

    /// Networked relational database
    Relational,
}

impl std::fmt::Display for BackendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendMode::Embedded => write!(f, "embedded"),
            BackendMode::Relational => write!(f, "relational"),
        }
    }
}

/// Result from a vector similarity search
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub doc_id: String,
    pub content: String,
    pub source_type: String,
    /// Higher is more similar
    pub score: f32,
}

/// Contract shared by all document backends
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Mode reported for status and logging
    fn mode(&self) -> BackendMode;

    /// Insert a document, replacing any earlier document with the same id
    async fn upsert(&self, document: &Document, embedding: &[f32]) -> Result<()>;

    /// Up to `limit` nearest documents, most similar first
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Number of indexed documents
    async fn count(&self) -> Result<usize>;
}

/// Sort by descending score, keeping at most `limit` results
pub(crate) fn rank(mut results: Vec<SearchResult>, limit: usize) -> Vec<SearchResult> {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit);
    results
}

//! Local on-disk backend: LanceDB vectors plus a SQLite document catalog

use async_trait::async_trait;

use crate::config::Config;
use crate::document::Document;
use crate::error::Result;

use super::{rank, BackendMode, DocumentStore, SearchResult, SqliteStorage, VectorStorage};

/// Embedded backend that persists under `Config::data_dir`
pub struct EmbeddedStore {
    sqlite: SqliteStorage,
    vector: VectorStorage,
}

impl EmbeddedStore {
    /// Open or create the named collection for vectors of `dimensions` length
    pub async fn open(config: &Config, dimensions: usize) -> Result<Self> {
        config.ensure_dirs()?;

        let sqlite = SqliteStorage::new(&config.sqlite_path())?;
        let vector =
            VectorStorage::new(&config.vector_db_path(), &config.collection_name, dimensions)
                .await?;

        tracing::info!(
            collection = %config.collection_name,
            data_dir = ?config.data_dir,
            "Opened embedded document store"
        );

        Ok(Self { sqlite, vector })
    }
}

#[async_trait]
impl DocumentStore for EmbeddedStore {
    fn mode(&self) -> BackendMode {
        BackendMode::Embedded
    }

    async fn upsert(&self, document: &Document, embedding: &[f32]) -> Result<()> {
        // Catalog first; a failed vector write puts the earlier record back.
        let previous = self.sqlite.get_document(&document.doc_id)?;
        self.sqlite.save_document(document)?;

        if let Err(e) = self.vector.upsert(document, embedding).await {
            let restored = match &previous {
                Some(earlier) => self.sqlite.save_document(earlier),
                None => self.sqlite.delete_document(&document.doc_id),
            };
            if let Err(restore_err) = restored {
                tracing::error!(
                    doc_id = %document.doc_id,
                    error = %restore_err,
                    "Failed to roll back catalog record"
                );
            }
            return Err(e);
        }

        Ok(())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let results = self.vector.search(query_embedding, limit).await?;
        Ok(rank(results, limit))
    }

    // Searches read the vector table, so it is also what gets counted
    async fn count(&self) -> Result<usize> {
        self.vector.count().await
    }
}

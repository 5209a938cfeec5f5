//! The context store: backend selection plus document ingestion and search

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::Config;
use crate::document::{Document, IngestReceipt};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::storage::{BackendMode, DocumentStore, EmbeddedStore, PostgresStore};

/// Snapshot of the store for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub mode: BackendMode,
    pub embedding_model: String,
    /// `None` when the backend cannot count its documents
    pub document_count: Option<usize>,
}

/// Uniform document indexing and semantic search over one backend.
///
/// The backend is picked once, at construction, and never changes.
pub struct ContextStore {
    embedder: Arc<dyn Embedder>,
    backend: Arc<dyn DocumentStore>,
}

impl ContextStore {
    /// Open the store described by `config`.
    ///
    /// With a `database_url`, the relational backend is tried once; if the
    /// connection or its liveness check fails the store falls back to the
    /// embedded backend. Failures opening the embedded backend propagate.
    pub async fn open(config: &Config, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let backend = select_backend(config, embedder.dimensions()).await?;
        tracing::info!(mode = %backend.mode(), "Context store ready");
        Ok(Self::with_backend(embedder, backend))
    }

    /// Build a store around an already constructed backend
    pub fn with_backend(embedder: Arc<dyn Embedder>, backend: Arc<dyn DocumentStore>) -> Self {
        Self { embedder, backend }
    }

    /// Active backend mode
    pub fn mode(&self) -> BackendMode {
        self.backend.mode()
    }

    /// Embedding model shared by both backends
    pub fn embedding_model(&self) -> &str {
        self.embedder.model_name()
    }

    /// Embed and store a document under `doc_id`
    pub async fn add_document(&self, content: &str, source: &str, doc_id: &str) -> Result<bool> {
        let receipt = self.ingest(&Document::new(doc_id, content, source)).await?;
        Ok(receipt.success)
    }

    /// Embed and store a full document including its metadata.
    ///
    /// A document with an existing `doc_id` replaces the earlier one.
    pub async fn ingest(&self, document: &Document) -> Result<IngestReceipt> {
        document.validate()?;

        let embedding = self.embedder.embed(&document.content).await?;
        self.backend.upsert(document, &embedding).await?;

        tracing::debug!(
            doc_id = %document.doc_id,
            source_type = %document.source_type,
            "Document indexed"
        );

        Ok(IngestReceipt {
            doc_id: document.doc_id.clone(),
            success: true,
        })
    }

    /// Contents of up to `n_results` stored documents, most similar to `query` first.
    ///
    /// No similarity threshold is applied; an empty store yields an empty list.
    pub async fn search_context(&self, query: &str, n_results: usize) -> Result<Vec<String>> {
        if n_results == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        let results = self.backend.search(&query_embedding, n_results).await?;

        tracing::debug!(requested = n_results, returned = results.len(), "Context retrieved");

        Ok(results.into_iter().map(|r| r.content).collect())
    }

    /// Total indexed documents in the active backend
    pub async fn document_count(&self) -> Result<usize> {
        self.backend.count().await
    }

    /// Mode, embedding model and document count
    pub async fn status(&self) -> Result<StoreStatus> {
        let document_count = match self.backend.count().await {
            Ok(count) => Some(count),
            Err(e) if e.is_not_implemented() => None,
            Err(e) => return Err(e),
        };

        Ok(StoreStatus {
            mode: self.mode(),
            embedding_model: self.embedding_model().to_string(),
            document_count,
        })
    }
}

async fn select_backend(config: &Config, dimensions: usize) -> Result<Arc<dyn DocumentStore>> {
    if let Some(url) = config.database_url.as_deref() {
        let timeout = Duration::from_secs(config.database_connect_timeout_secs);
        match PostgresStore::connect(url, timeout).await {
            Ok(store) => {
                tracing::info!("Connected to relational store");
                return Ok(Arc::new(store));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Relational store unreachable, using embedded store");
            }
        }
    }

    let store = EmbeddedStore::open(config, dimensions).await?;
    Ok(Arc::new(store))
}

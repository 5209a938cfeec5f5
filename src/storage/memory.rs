//! In-memory [`DocumentStore`] for tests and throwaway sessions.
//!
//! Vector search is brute-force cosine similarity over all stored vectors.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::document::Document;
use crate::error::{Error, Result};

use super::{rank, BackendMode, DocumentStore, SearchResult};

struct StoredDocument {
    content: String,
    source_type: String,
    vector: Vec<f32>,
}

/// Store holding everything in a map keyed by `doc_id`
#[derive(Default)]
pub struct InMemoryStore {
    docs: RwLock<HashMap<String, StoredDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn mode(&self) -> BackendMode {
        BackendMode::Embedded
    }

    async fn upsert(&self, document: &Document, embedding: &[f32]) -> Result<()> {
        let mut docs = self.docs.write().map_err(|e| Error::storage(e.to_string()))?;
        docs.insert(
            document.doc_id.clone(),
            StoredDocument {
                content: document.content.clone(),
                source_type: document.source_type.clone(),
                vector: embedding.to_vec(),
            },
        );
        Ok(())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let docs = self.docs.read().map_err(|e| Error::storage(e.to_string()))?;
        let results = docs
            .iter()
            .map(|(doc_id, stored)| SearchResult {
                doc_id: doc_id.clone(),
                content: stored.content.clone(),
                source_type: stored.source_type.clone(),
                score: cosine_sim(query_embedding, &stored.vector),
            })
            .collect();
        Ok(rank(results, limit))
    }

    async fn count(&self) -> Result<usize> {
        let docs = self.docs.read().map_err(|e| Error::storage(e.to_string()))?;
        Ok(docs.len())
    }
}

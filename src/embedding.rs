//! Embedding generation using fastembed (local, no API keys)

use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::Mutex;

use crate::error::{Error, Result};

/// Deterministic text-to-vector mapping shared by documents and queries.
///
/// Every backend uses the same embedder so similarity means the same thing
/// regardless of where vectors are stored.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Model identifier the vectors were produced with
    fn model_name(&self) -> &str;

    /// Length of every vector this embedder returns
    fn dimensions(&self) -> usize;
}

/// Name reported for vectors produced by [`EmbeddingService`]
pub const MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Vector length of [`MODEL_NAME`]
pub const MODEL_DIMENSIONS: usize = 384;

// Pinned so stored vectors stay comparable across runs
const MODEL: EmbeddingModel = EmbeddingModel::AllMiniLML6V2;

/// Embedding service for generating vector embeddings locally
pub struct EmbeddingService {
    model: Arc<Mutex<TextEmbedding>>,
}

impl EmbeddingService {
    /// Create a new embedding service with local model
    pub fn new() -> Result<Self> {
        // Model downloads automatically on first use to ~/.cache/fastembed
        let model =
            TextEmbedding::try_new(InitOptions::new(MODEL).with_show_download_progress(true))
                .map_err(|e| Error::embedding(format!("Failed to load embedding model: {}", e)))?;

        tracing::info!(model = MODEL_NAME, "Embedding model loaded");

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

#[async_trait]
impl Embedder for EmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut guard = self.model.lock().await;
        let embeddings = guard
            .embed(vec![text.to_string()], None)
            .map_err(|e| Error::embedding(format!("Embedding failed: {}", e)))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("No embedding returned"))
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn dimensions(&self) -> usize {
        MODEL_DIMENSIONS
    }
}

/// Token counter using tiktoken
pub struct TokenCounter {
    bpe: tiktoken_rs::CoreBPE,
}

impl TokenCounter {
    /// Create a new token counter for a specific model
    pub fn new(model: &str) -> Result<Self> {
        let bpe = tiktoken_rs::get_bpe_from_model(model)
            .map_err(|e| Error::config(format!("Failed to load tokenizer for {}: {}", model, e)))?;

        Ok(Self { bpe })
    }

    /// cl100k_base, close enough to budget prompts for hosted models
    pub fn cl100k() -> Result<Self> {
        Self::new("gpt-4")
    }

    /// Count tokens in a text
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

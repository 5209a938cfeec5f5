//! Shared fakes for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use dayplan::storage::SearchResult;
use dayplan::{BackendMode, Document, DocumentStore, Embedder, Error, LanguageModel, Result};

pub const DIMENSIONS: usize = 64;

/// Bag-of-words embedder: every distinct word gets its own axis.
///
/// Axes are assigned on first sight and never reused, so a given text maps
/// to the same vector for the lifetime of the embedder.
#[derive(Default)]
pub struct VocabularyEmbedder {
    vocabulary: Mutex<HashMap<String, usize>>,
}

impl VocabularyEmbedder {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl Embedder for VocabularyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vocabulary = self.vocabulary.lock().unwrap();
        let mut vector = vec![0.0f32; DIMENSIONS];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
        {
            let next = vocabulary.len();
            let axis = *vocabulary.entry(word).or_insert(next) % DIMENSIONS;
            vector[axis] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        } else {
            // Give empty-word texts a direction so distances stay finite
            vector[DIMENSIONS - 1] = 1.0;
        }
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        "test-vocabulary"
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }
}

/// Model that records every call and answers with a canned reply
pub struct RecordingModel {
    reply: String,
    calls: Mutex<Vec<(Vec<String>, f32)>>,
}

impl RecordingModel {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(Vec<String>, f32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for RecordingModel {
    async fn generate(&self, segments: &[String], temperature: f32) -> Result<String> {
        self.calls.lock().unwrap().push((segments.to_vec(), temperature));
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        "recording-model"
    }
}

/// Model that always fails, counting attempts
#[derive(Default)]
pub struct FailingModel {
    attempts: Mutex<usize>,
}

impl FailingModel {
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl LanguageModel for FailingModel {
    async fn generate(&self, _segments: &[String], _temperature: f32) -> Result<String> {
        *self.attempts.lock().unwrap() += 1;
        Err(Error::generation("upstream returned 503"))
    }

    fn model_name(&self) -> &str {
        "failing-model"
    }
}

/// Backend whose every operation fails
pub struct BrokenStore;

#[async_trait]
impl DocumentStore for BrokenStore {
    fn mode(&self) -> BackendMode {
        BackendMode::Embedded
    }

    async fn upsert(&self, _document: &Document, _embedding: &[f32]) -> Result<()> {
        Err(Error::storage("disk full"))
    }

    async fn search(&self, _query_embedding: &[f32], _limit: usize) -> Result<Vec<SearchResult>> {
        Err(Error::storage("index corrupted"))
    }

    async fn count(&self) -> Result<usize> {
        Err(Error::storage("index corrupted"))
    }
}

/// Relational backend whose document operations are not built yet
pub struct StubRelationalStore;

#[async_trait]
impl DocumentStore for StubRelationalStore {
    fn mode(&self) -> BackendMode {
        BackendMode::Relational
    }

    async fn upsert(&self, _document: &Document, _embedding: &[f32]) -> Result<()> {
        Err(Error::not_implemented("relational", "add_document"))
    }

    async fn search(&self, _query_embedding: &[f32], _limit: usize) -> Result<Vec<SearchResult>> {
        Err(Error::not_implemented("relational", "search_context"))
    }

    async fn count(&self) -> Result<usize> {
        Err(Error::not_implemented("relational", "document_count"))
    }
}

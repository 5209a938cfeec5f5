//! Entry points used by the HTTP layer

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::Config;
use crate::context::ContextStore;
use crate::document::{Document, IngestReceipt};
use crate::embedding::EmbeddingService;
use crate::error::{Error, Result};
use crate::planner::{PlanGenerator, PlanRequest};
use crate::storage::BackendMode;

/// Reported by `query_status`
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub mode: BackendMode,
    pub model_name: String,
    pub embedding_model: String,
    pub document_count: Option<usize>,
}

/// A generated plan together with the day it covers
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub target_date: NaiveDate,
    pub plan: String,
}

/// Store and planner wired together
pub struct Assistant {
    store: Arc<ContextStore>,
    planner: PlanGenerator,
}

impl Assistant {
    pub fn new(store: Arc<ContextStore>, planner: PlanGenerator) -> Self {
        Self { store, planner }
    }

    /// Start-up wiring: credentials are checked before any store or network work
    pub async fn from_config(config: &Config) -> Result<Self> {
        let has_key = config
            .gemini_api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if !has_key {
            return Err(Error::config("GEMINI_API_KEY is not set"));
        }

        let embedder = Arc::new(EmbeddingService::new()?);
        let store = Arc::new(ContextStore::open(config, embedder).await?);
        let planner = PlanGenerator::from_config(config, store.clone())?;
        Ok(Self::new(store, planner))
    }

    pub fn store(&self) -> &Arc<ContextStore> {
        &self.store
    }

    /// Index one document
    pub async fn ingest(&self, document: &Document) -> Result<IngestReceipt> {
        self.store.ingest(document).await
    }

    /// Backend mode, model names and document count
    pub async fn query_status(&self) -> Result<Status> {
        let store = self.store.status().await?;
        Ok(Status {
            mode: store.mode,
            model_name: self.planner.model_name().to_string(),
            embedding_model: store.embedding_model,
            document_count: store.document_count,
        })
    }

    /// Plan for the requested (or current) day
    pub async fn generate_plan(&self, request: &PlanRequest) -> Result<Plan> {
        let target_date = request.resolved_date();
        let plan = self
            .planner
            .generate_daily_plan(target_date, &request.additional_guidance)
            .await?;
        Ok(Plan { target_date, plan })
    }

    /// Rework a previously generated plan
    pub async fn revise_plan(&self, existing_plan: &str, new_guidance: &str) -> Result<String> {
        self.planner.revise_plan(existing_plan, new_guidance).await
    }
}

//! Daily plan generation grounded in retrieved context

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::context::ContextStore;
use crate::embedding::TokenCounter;
use crate::error::{Error, ErrorKind, Result};
use crate::llm::{GeminiClient, LanguageModel};

/// Documents retrieved per plan
pub const DEFAULT_CONTEXT_RESULTS: usize = 10;

/// Sampling temperature for every generation call
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Persona segment sent ahead of every request
pub const SYSTEM_PROMPT: &str = "You are a professional assistant who plans a working day. \
Based on the information provided (emails, meetings, notes) and the user's guidance, \
produce a realistic plan for the day.";

/// A request for a daily plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Day to plan; today when absent
    #[serde(default)]
    pub target_date: Option<NaiveDate>,

    /// Free-text instructions for the day
    #[serde(default)]
    pub additional_guidance: String,
}

impl PlanRequest {
    pub fn new(target_date: NaiveDate, additional_guidance: impl Into<String>) -> Self {
        Self {
            target_date: Some(target_date),
            additional_guidance: additional_guidance.into(),
        }
    }

    /// The requested date, or today's local date
    pub fn resolved_date(&self) -> NaiveDate {
        self.target_date.unwrap_or_else(|| Local::now().date_naive())
    }
}

/// A request to rework an existing plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRevision {
    pub existing_plan: String,
    pub new_guidance: String,
}

/// Retrieval query for a given day
pub fn daily_query(date: NaiveDate) -> String {
    format!(
        "Summarize the most important tasks, meetings and obligations from emails and notes \
         that are due on {} or in the coming days.",
        date.format("%Y-%m-%d")
    )
}

/// One bullet per context item, in the order given
pub fn format_context(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// User segment for a daily plan
pub fn daily_prompt(context_block: &str, guidance: &str) -> String {
    format!(
        "Here is the key information I collected about your commitments:\n\n\
         --- CONTEXT FROM EMAILS AND MEETINGS ---\n{}\n\
         --- ADDITIONAL GUIDANCE FOR TODAY ---\n{}\n\n\
         Based on the above, produce a plan for the day as a numbered list, \
         giving the estimated duration of each block.",
        context_block, guidance
    )
}

/// User segment for revising a plan
pub fn revision_prompt(existing_plan: &str, new_guidance: &str) -> String {
    format!(
        "Here is the current plan for the day:\n\n\
         --- CURRENT PLAN ---\n{}\n\
         --- NEW GUIDANCE ---\n{}\n\n\
         Revise the plan to follow the new guidance. Keep the numbered list format \
         with the estimated duration of each block.",
        existing_plan, new_guidance
    )
}

/// Token allowance for the context block
pub struct ContextBudget {
    pub limit: usize,
    pub used: usize,
}

impl ContextBudget {
    pub fn new(limit: usize) -> Self {
        Self { limit, used: 0 }
    }

    /// Whether `tokens` more would still fit
    pub fn fits(&self, tokens: usize) -> bool {
        tokens <= self.remaining()
    }

    pub fn add(&mut self, tokens: usize) {
        self.used += tokens;
    }

    /// Get remaining tokens
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.used)
    }
}

struct BudgetGuard {
    counter: TokenCounter,
    limit: usize,
}

impl BudgetGuard {
    /// Keep the longest prefix of `items` that fits the budget.
    ///
    /// The first item is always kept, whole, so the model sees at least the
    /// best match.
    fn apply(&self, items: Vec<String>) -> Vec<String> {
        let mut budget = ContextBudget::new(self.limit);
        let total = items.len();
        let mut kept = Vec::with_capacity(total);

        for item in items {
            let tokens = self.counter.count(&item);
            if !kept.is_empty() && !budget.fits(tokens) {
                break;
            }
            budget.add(tokens);
            kept.push(item);
        }

        if kept.len() < total {
            tracing::warn!(
                kept = kept.len(),
                dropped = total - kept.len(),
                limit = self.limit,
                "Context exceeded token budget, dropping least similar items"
            );
        }

        kept
    }
}

/// Assembles one grounded generation request per plan
pub struct PlanGenerator {
    store: Arc<ContextStore>,
    model: Arc<dyn LanguageModel>,
    budget: Option<BudgetGuard>,
    context_results: usize,
    temperature: f32,
}

impl PlanGenerator {
    /// Generator with fixed defaults and no context budget
    pub fn new(store: Arc<ContextStore>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            store,
            model,
            budget: None,
            context_results: DEFAULT_CONTEXT_RESULTS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Generator backed by Gemini; fails without an API key
    pub fn from_config(config: &Config, store: Arc<ContextStore>) -> Result<Self> {
        let model = GeminiClient::from_config(config)?;
        let mut generator = Self::new(store, Arc::new(model));
        generator.context_results = config.context_results;
        generator.temperature = config.temperature;
        if config.context_token_budget > 0 {
            generator = generator
                .with_context_budget(TokenCounter::cl100k()?, config.context_token_budget);
        }
        Ok(generator)
    }

    /// Cap the retrieved context at `limit` tokens
    pub fn with_context_budget(mut self, counter: TokenCounter, limit: usize) -> Self {
        self.budget = Some(BudgetGuard { counter, limit });
        self
    }

    /// Name of the generative model
    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Produce a plan for `date`, returned exactly as the model wrote it.
    ///
    /// Retrieval failures surface as storage errors, model failures as
    /// generation errors. Nothing is retried.
    pub async fn generate_daily_plan(&self, date: NaiveDate, guidance: &str) -> Result<String> {
        let query = daily_query(date);
        let mut context = self.store.search_context(&query, self.context_results).await?;
        if let Some(guard) = &self.budget {
            context = guard.apply(context);
        }

        tracing::info!(%date, context_items = context.len(), "Generating daily plan");

        let segments = vec![
            SYSTEM_PROMPT.to_string(),
            daily_prompt(&format_context(&context), guidance),
        ];
        self.invoke(&segments).await
    }

    /// Rework an existing plan with new guidance; no retrieval
    pub async fn revise_plan(&self, existing_plan: &str, new_guidance: &str) -> Result<String> {
        if existing_plan.trim().is_empty() {
            return Err(Error::invalid_input("existing_plan must not be empty"));
        }

        tracing::info!("Revising plan");

        let segments = vec![
            SYSTEM_PROMPT.to_string(),
            revision_prompt(existing_plan, new_guidance),
        ];
        self.invoke(&segments).await
    }

    async fn invoke(&self, segments: &[String]) -> Result<String> {
        self.model
            .generate(segments, self.temperature)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::Generation => e,
                _ => Error::generation(e.to_string()),
            })
    }
}

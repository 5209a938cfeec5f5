//! # dayplan
//!
//! A retrieval-augmented planning assistant. Free-text documents (emails,
//! notes, transcriptions) are embedded and indexed; a daily plan is produced
//! by retrieving the most relevant documents and handing them, together with
//! the user's guidance, to a generative model.
//!
//! ## Architecture
//!
//! - **Context store** - embeds documents with a local model and stores them
//!   in one of two backends, picked once at start-up:
//!   - *embedded*: LanceDB vectors plus a SQLite catalog on local disk
//!   - *relational*: Postgres, used when `DATABASE_URL` is reachable
//! - **Plan generator** - turns a date and guidance into one model call
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dayplan::{Assistant, Config, Document, PlanRequest};
//!
//! let config = Config::from_env()?;
//! let assistant = Assistant::from_config(&config).await?;
//!
//! assistant.ingest(&Document::new("mail-1", "Invoice due Friday", "email")).await?;
//!
//! let plan = assistant
//!     .generate_plan(&PlanRequest { target_date: None, additional_guidance: "call client".into() })
//!     .await?;
//! ```

pub mod assistant;
pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod planner;
pub mod storage;

pub use assistant::{Assistant, Plan, Status};
pub use config::Config;
pub use context::{ContextStore, StoreStatus};
pub use document::{Document, IngestReceipt};
pub use embedding::{Embedder, EmbeddingService, TokenCounter};
pub use error::{Error, ErrorKind, Result};
pub use llm::{GeminiClient, LanguageModel};
pub use planner::{PlanGenerator, PlanRequest, PlanRevision};
pub use storage::{BackendMode, DocumentStore, InMemoryStore};

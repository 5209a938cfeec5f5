//! Documents accepted by the context store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Source label used when a caller does not supply one
pub const DEFAULT_SOURCE_TYPE: &str = "manual_note";

/// A free-text document (email, note, transcription)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Caller-supplied unique identifier
    pub doc_id: String,

    /// Full text body - the unit of embedding and retrieval
    pub content: String,

    /// Free-text origin label (e.g. "email", "manual_note")
    #[serde(default = "default_source_type")]
    pub source_type: String,

    /// Optional deadline, stored as metadata only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    /// Opaque caller metadata
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

fn default_source_type() -> String {
    DEFAULT_SOURCE_TYPE.to_string()
}

impl Document {
    /// Create a new document
    pub fn new(
        doc_id: impl Into<String>,
        content: impl Into<String>,
        source_type: impl Into<String>,
    ) -> Self {
        Self {
            doc_id: doc_id.into(),
            content: content.into(),
            source_type: source_type.into(),
            due_date: None,
            metadata: Map::new(),
        }
    }

    /// Attach a due date
    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Attach caller metadata
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Reject documents that cannot be indexed
    pub fn validate(&self) -> Result<()> {
        if self.doc_id.trim().is_empty() {
            return Err(Error::invalid_input("doc_id must not be empty"));
        }
        if self.content.trim().is_empty() {
            return Err(Error::invalid_input(format!(
                "document {} has empty content",
                self.doc_id
            )));
        }
        Ok(())
    }
}

/// Acknowledgement returned from ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub doc_id: String,
    pub success: bool,
}

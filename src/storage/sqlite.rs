//! SQLite catalog of ingested documents and their metadata

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::document::Document;
use crate::error::{Error, Result};

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) the catalog at `path`
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Initialize schema
        conn.execute_batch(include_str!("schema.sql"))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert a document record, replacing any earlier record with the same id
    pub fn save_document(&self, document: &Document) -> Result<()> {
        let conn = self.conn.lock().map_err(|e| Error::storage(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO documents (doc_id, content, source_type, due_date, metadata, ingested_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(doc_id) DO UPDATE SET
                content = excluded.content,
                source_type = excluded.source_type,
                due_date = excluded.due_date,
                metadata = excluded.metadata,
                ingested_at = excluded.ingested_at
            "#,
            params![
                document.doc_id,
                document.content,
                document.source_type,
                document.due_date.map(|dt| dt.to_rfc3339()),
                serde_json::to_string(&document.metadata)?,
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Get a document by id
    pub fn get_document(&self, doc_id: &str) -> Result<Option<Document>> {
        let conn = self.conn.lock().map_err(|e| Error::storage(e.to_string()))?;

        let row = conn
            .query_row(
                r#"
                SELECT doc_id, content, source_type, due_date, metadata
                FROM documents WHERE doc_id = ?1
                "#,
                params![doc_id],
                |row| {
                    Ok(DocumentRow {
                        doc_id: row.get(0)?,
                        content: row.get(1)?,
                        source_type: row.get(2)?,
                        due_date: row.get(3)?,
                        metadata: row.get(4)?,
                    })
                },
            )
            .optional()?;

        row.map(DocumentRow::into_document).transpose()
    }

    /// Remove a document record; absent ids are not an error
    pub fn delete_document(&self, doc_id: &str) -> Result<()> {
        let conn = self.conn.lock().map_err(|e| Error::storage(e.to_string()))?;
        conn.execute("DELETE FROM documents WHERE doc_id = ?1", params![doc_id])?;
        Ok(())
    }
}

/// Intermediate struct for reading from SQLite
struct DocumentRow {
    doc_id: String,
    content: String,
    source_type: String,
    due_date: Option<String>,
    metadata: String,
}

impl DocumentRow {
    fn into_document(self) -> Result<Document> {
        let due_date = self
            .due_date
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| Error::storage(format!("Bad due_date {:?}: {}", s, e)))
            })
            .transpose()?;

        Ok(Document {
            doc_id: self.doc_id,
            content: self.content,
            source_type: self.source_type,
            due_date,
            metadata: serde_json::from_str(&self.metadata)?,
        })
    }
}

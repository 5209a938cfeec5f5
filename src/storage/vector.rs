//! Vector storage using LanceDB for semantic search

use std::path::Path;
use std::sync::Arc;

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use futures::TryStreamExt;
use lance_arrow::FixedSizeListArrayExt;
use lancedb::connect;
use lancedb::query::{ExecutableQuery, QueryBase};

use crate::document::Document;
use crate::error::{Error, Result};

use super::SearchResult;

/// Vector storage backend using LanceDB
pub struct VectorStorage {
    db: lancedb::Connection,
    table_name: String,
    dimensions: usize,
}

impl VectorStorage {
    /// Open the vector database at `path`, creating the collection table if needed
    pub async fn new(path: &Path, table_name: &str, dimensions: usize) -> Result<Self> {
        let uri = path
            .to_str()
            .ok_or_else(|| Error::vector_db(format!("Non UTF-8 path: {}", path.display())))?;

        let db = connect(uri)
            .execute()
            .await
            .map_err(|e| Error::vector_db(e.to_string()))?;

        let storage = Self {
            db,
            table_name: table_name.to_string(),
            dimensions,
        };

        storage.ensure_table().await?;

        Ok(storage)
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Field::new("doc_id", DataType::Utf8, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("source_type", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    self.dimensions as i32,
                ),
                false,
            ),
        ])
    }

    async fn ensure_table(&self) -> Result<()> {
        let tables = self
            .db
            .table_names()
            .execute()
            .await
            .map_err(|e| Error::vector_db(e.to_string()))?;

        if !tables.contains(&self.table_name) {
            let schema = Arc::new(self.schema());
            let empty_batch = RecordBatch::new_empty(schema.clone());
            let reader = RecordBatchIterator::new(vec![empty_batch].into_iter().map(Ok), schema);

            self.db
                .create_table(&self.table_name, Box::new(reader))
                .execute()
                .await
                .map_err(|e| Error::vector_db(e.to_string()))?;

            tracing::info!(table = %self.table_name, "Created vector table");
        }

        Ok(())
    }

    async fn table(&self) -> Result<lancedb::Table> {
        self.db
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| Error::vector_db(e.to_string()))
    }

    /// Insert a document vector, replacing any row with the same `doc_id`
    pub async fn upsert(&self, document: &Document, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimensions {
            return Err(Error::vector_db(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                embedding.len()
            )));
        }

        let table = self.table().await?;
        let predicate = id_predicate(&document.doc_id);

        // Rows being replaced, re-added if the new row cannot be written
        let previous: Vec<RecordBatch> = table
            .query()
            .only_if(predicate.clone())
            .execute()
            .await
            .map_err(|e| Error::vector_db(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e: lancedb::Error| Error::vector_db(e.to_string()))?;

        table
            .delete(&predicate)
            .await
            .map_err(|e| Error::vector_db(e.to_string()))?;

        let values = Float32Array::from(embedding.to_vec());
        let vector_array = FixedSizeListArray::try_new_from_values(values, self.dimensions as i32)
            .map_err(|e: arrow_schema::ArrowError| Error::vector_db(e.to_string()))?;

        let schema = Arc::new(self.schema());
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![document.doc_id.clone()])) as Arc<dyn Array>,
                Arc::new(StringArray::from(vec![document.content.clone()])),
                Arc::new(StringArray::from(vec![document.source_type.clone()])),
                Arc::new(vector_array),
            ],
        )
        .map_err(|e| Error::vector_db(e.to_string()))?;

        let reader = RecordBatchIterator::new(vec![batch].into_iter().map(Ok), schema.clone());

        if let Err(e) = table.add(Box::new(reader)).execute().await {
            if !previous.is_empty() {
                let restore = RecordBatchIterator::new(previous.into_iter().map(Ok), schema);
                if let Err(restore_err) = table.add(Box::new(restore)).execute().await {
                    tracing::error!(
                        doc_id = %document.doc_id,
                        error = %restore_err,
                        "Failed to restore replaced vector row"
                    );
                }
            }
            return Err(Error::vector_db(e.to_string()));
        }

        Ok(())
    }

    /// Number of stored documents
    pub async fn count(&self) -> Result<usize> {
        self.table()
            .await?
            .count_rows(None)
            .await
            .map_err(|e| Error::vector_db(e.to_string()))
    }

    /// Nearest neighbours of `query_embedding`, unfiltered, unordered
    pub async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let table = self.table().await?;

        // Flat search over an empty dataset is not worth a round trip.
        let rows = table
            .count_rows(None)
            .await
            .map_err(|e| Error::vector_db(e.to_string()))?;
        if rows == 0 || limit == 0 {
            return Ok(Vec::new());
        }

        let stream = table
            .vector_search(query_embedding.to_vec())
            .map_err(|e: lancedb::Error| Error::vector_db(e.to_string()))?
            .limit(limit)
            .execute()
            .await
            .map_err(|e: lancedb::Error| Error::vector_db(e.to_string()))?;

        let batches: Vec<RecordBatch> = stream
            .try_collect::<Vec<RecordBatch>>()
            .await
            .map_err(|e: lancedb::Error| Error::vector_db(e.to_string()))?;

        let mut search_results = Vec::new();

        for batch in batches {
            let ids = string_column(&batch, "doc_id")?;
            let contents = string_column(&batch, "content")?;
            let sources = string_column(&batch, "source_type")?;
            let distances = batch
                .column_by_name("_distance")
                .ok_or_else(|| Error::vector_db("Missing _distance column"))?
                .as_any()
                .downcast_ref::<Float32Array>()
                .ok_or_else(|| Error::vector_db("_distance column is not Float32Array"))?;

            for i in 0..batch.num_rows() {
                // LanceDB returns L2 distance, convert to similarity score
                let score = 1.0 / (1.0 + distances.value(i));

                search_results.push(SearchResult {
                    doc_id: ids.value(i).to_string(),
                    content: contents.value(i).to_string(),
                    source_type: sources.value(i).to_string(),
                    score,
                });
            }
        }

        Ok(search_results)
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::vector_db(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| Error::vector_db(format!("{} column is not StringArray", name)))
}

/// SQL predicate matching one document id, with quotes escaped
fn id_predicate(doc_id: &str) -> String {
    format!("doc_id = '{}'", doc_id.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_escapes_quotes() {
        assert_eq!(id_predicate("mail-1"), "doc_id = 'mail-1'");
        assert_eq!(id_predicate("o'brien"), "doc_id = 'o''brien'");
    }

    #[tokio::test]
    async fn rejects_wrong_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let storage = VectorStorage::new(dir.path(), "work_context", 4).await.unwrap();
        let err = storage
            .upsert(&Document::new("a", "text", "note"), &[1.0, 2.0])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("dimension mismatch"));
        assert_eq!(storage.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn upsert_replaces_row_with_same_id() {
        let dir = tempfile::tempdir().unwrap();
        let storage = VectorStorage::new(dir.path(), "work_context", 2).await.unwrap();

        storage.upsert(&Document::new("a", "first", "note"), &[1.0, 0.0]).await.unwrap();
        storage.upsert(&Document::new("a", "second", "note"), &[0.0, 1.0]).await.unwrap();
        storage.upsert(&Document::new("b", "other", "note"), &[1.0, 1.0]).await.unwrap();

        assert_eq!(storage.count().await.unwrap(), 2);
        let hits = storage.search(&[0.0, 1.0], 1).await.unwrap();
        assert_eq!(hits[0].doc_id, "a");
        assert_eq!(hits[0].content, "second");
    }
}

//! SQLite-backed document store
//!
//! All collections share one table. Bodies are stored as relaxed extended
//! JSON and re-normalized on read, so identifiers and dates round-trip.

use super::DocumentStore;
use async_trait::async_trait;
use docseed_common::extended_json::normalize_json;
use docseed_common::value::ID_FIELD;
use docseed_common::{Document, Error, ObjectId, Result, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Document store over a sqlx connection pool
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Whether `connection_string` names a SQLite database
    pub fn accepts(connection_string: &str) -> bool {
        connection_string.starts_with("sqlite:")
    }

    /// Connect and create the documents table if needed
    ///
    /// The database file is created when missing. In-memory databases get a
    /// single connection so every query sees the same data.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let in_memory = connection_string.contains(":memory:");

        let options = SqliteConnectOptions::from_str(connection_string)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            // Concurrent per-collection syncs wait on each other instead of failing
            .busy_timeout(Duration::from_millis(5000));

        let mut pool_options = SqlitePoolOptions::new().max_connections(5);
        if in_memory {
            // Closing the only connection would drop the database
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;

        let store = Self { pool };
        store.create_documents_table().await?;

        info!("Opened document store: {}", redact(connection_string));
        Ok(store)
    }

    async fn create_documents_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                doc_id TEXT NOT NULL,
                body TEXT NOT NULL,
                UNIQUE (collection, doc_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Drop any query string (it may carry credentials) before logging
fn redact(connection_string: &str) -> &str {
    connection_string
        .split_once('?')
        .map(|(base, _)| base)
        .unwrap_or(connection_string)
}

/// Put `_id` first, generating one when absent
fn with_id(collection: &str, index: usize, value: &Value) -> Result<Document> {
    let doc = value.as_document().ok_or_else(|| Error::Insertion {
        entity: collection.to_string(),
        reason: format!(
            "document {} is a {}, expected a document",
            index,
            value.type_name()
        ),
    })?;

    let id = doc
        .get(ID_FIELD)
        .cloned()
        .unwrap_or_else(|| Value::ObjectId(ObjectId::new()));

    let mut out = Document::new();
    out.insert(ID_FIELD, id);
    for (key, field) in doc.iter().filter(|(key, _)| *key != ID_FIELD) {
        out.insert(key, field.clone());
    }
    Ok(out)
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn delete_all(&self, collection: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ?")
            .bind(collection)
            .execute(&self.pool)
            .await?;

        debug!("Deleted {} documents from {}", result.rows_affected(), collection);
        Ok(result.rows_affected())
    }

    async fn insert_many(&self, collection: &str, documents: &[Value]) -> Result<u64> {
        // Validate and encode everything before opening the transaction
        let mut rows = Vec::with_capacity(documents.len());
        for (index, value) in documents.iter().enumerate() {
            let doc = with_id(collection, index, value)?;
            let id_json = doc
                .get(ID_FIELD)
                .map(Value::to_extended_json)
                .unwrap_or(serde_json::Value::Null);
            let doc_id = serde_json::to_string(&id_json)?;
            let body = serde_json::to_string(&doc.to_extended_json())?;
            rows.push((index, doc_id, body));
        }

        let mut tx = self.pool.begin().await?;
        for (index, doc_id, body) in &rows {
            sqlx::query("INSERT INTO documents (collection, doc_id, body) VALUES (?, ?, ?)")
                .bind(collection)
                .bind(doc_id)
                .bind(body)
                .execute(&mut *tx)
                .await
                .map_err(|e| Error::Insertion {
                    entity: collection.to_string(),
                    reason: format!("document {} (_id {}): {}", index, doc_id, e),
                })?;
        }
        // Dropping `tx` on the error paths above rolls the batch back
        tx.commit().await?;

        debug!("Inserted {} documents into {}", rows.len(), collection);
        Ok(rows.len() as u64)
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>> {
        let bodies: Vec<String> =
            sqlx::query_scalar("SELECT body FROM documents WHERE collection = ? ORDER BY seq ASC")
                .bind(collection)
                .fetch_all(&self.pool)
                .await?;

        let mut documents = Vec::with_capacity(bodies.len());
        for body in bodies {
            let json: serde_json::Value = serde_json::from_str(&body)?;
            // insert_many only ever writes documents
            if let Value::Document(doc) = normalize_json(json) {
                documents.push(doc);
            }
        }
        Ok(documents)
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!("Document store closed");
    }
}

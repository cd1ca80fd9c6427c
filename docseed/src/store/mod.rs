//! Document store abstraction
//!
//! The loader only needs three things from a store: wipe a collection,
//! bulk-insert into it, and shut down. Reads exist for verification.

use async_trait::async_trait;
use docseed_common::{Document, Result, Value};

mod sqlite;

pub use sqlite::SqliteStore;

/// Schema-less document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store backend identifier (e.g., "sqlite")
    fn backend(&self) -> &'static str;

    /// Delete every document in `collection`, returning how many were removed
    async fn delete_all(&self, collection: &str) -> Result<u64>;

    /// Insert all documents or none
    ///
    /// Documents without an `_id` get a fresh identifier. Any rejected
    /// element (a non-document, a duplicate `_id`) fails the whole batch
    /// with `Error::Insertion`.
    async fn insert_many(&self, collection: &str, documents: &[Value]) -> Result<u64>;

    /// Number of documents in `collection`
    async fn count(&self, collection: &str) -> Result<u64>;

    /// All documents in `collection`, in insertion order
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>>;

    /// Release the connection
    async fn close(&self);
}

/// Open a store for `connection_string`
///
/// Only `sqlite:` URLs are supported; other schemes are a configuration error.
pub async fn connect(connection_string: &str) -> Result<Box<dyn DocumentStore>> {
    if SqliteStore::accepts(connection_string) {
        let store = SqliteStore::connect(connection_string).await?;
        return Ok(Box::new(store));
    }

    let scheme = connection_string
        .split_once(':')
        .map(|(scheme, _)| scheme)
        .unwrap_or(connection_string);
    Err(docseed_common::Error::Config(format!(
        "Unsupported store scheme '{}' (expected sqlite:)",
        scheme
    )))
}

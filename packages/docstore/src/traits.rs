use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::query::{Document, Query};

/// Per-collection document CRUD plus predicate queries.
///
/// Documents are JSON objects keyed by a caller-supplied id. Consistency is
/// whatever the hosted store provides: last-write-wins per document, no
/// cross-document transactions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document. Fails with [`StoreError::AlreadyExists`] if the id
    /// is taken.
    async fn insert(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError>;

    /// Fetch a document by id, or `None` if it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Merge the top-level fields of `patch` into an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] if the document does not exist.
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError>;

    /// Delete a document. Returns `true` if it existed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// Run a query against a collection.
    ///
    /// Ordered queries may fail with [`StoreError::IndexRequired`] when the
    /// store has no index for the ordering field; the unordered form of the
    /// same query must then yield the same result set.
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Atomically add `delta` to a numeric top-level field.
    ///
    /// A missing field is treated as zero. Fails with
    /// [`StoreError::NotFound`] if the document does not exist.
    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<(), StoreError>;
}

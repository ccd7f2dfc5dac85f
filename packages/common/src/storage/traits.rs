use async_trait::async_trait;

use super::error::StorageError;

/// Key-addressed object storage.
///
/// Keys are slash-separated virtual paths validated by
/// [`super::validate_key`]. Backends treat keys as opaque identifiers; the
/// hierarchy only matters for [`list`](ObjectStore::list) prefix filtering.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under the given key, replacing any existing object.
    async fn put(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Retrieve all bytes for an object.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Delete an object.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// Get the size of an object in bytes.
    async fn size(&self, key: &str) -> Result<u64, StorageError>;

    /// List all object keys starting with the given prefix.
    ///
    /// An empty prefix lists every object.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

use async_trait::async_trait;
use dashmap::DashMap;

use super::error::StorageError;
use super::key::validate_key;
use super::traits::ObjectStore;

/// In-memory object store for tests and local development.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: DashMap<String, Vec<u8>>,
    max_size: Option<u64>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects objects larger than `max_size` bytes.
    pub fn with_max_size(max_size: u64) -> Self {
        Self {
            objects: DashMap::new(),
            max_size: Some(max_size),
        }
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let key = validate_key(key)?;
        if let Some(limit) = self.max_size
            && data.len() as u64 > limit
        {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit,
            });
        }
        self.objects.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let key = validate_key(key)?;
        self.objects
            .get(key)
            .map(|entry| entry.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let key = validate_key(key)?;
        Ok(self.objects.contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let key = validate_key(key)?;
        Ok(self.objects.remove(key).is_some())
    }

    async fn size(&self, key: &str) -> Result<u64, StorageError> {
        let key = validate_key(key)?;
        self.objects
            .get(key)
            .map(|entry| entry.len() as u64)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self
            .objects
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|k| k.starts_with(prefix))
            .collect();
        keys.sort();
        Ok(keys)
    }
}

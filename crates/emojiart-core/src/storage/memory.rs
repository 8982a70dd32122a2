//! In-memory storage implementation.

use super::{Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory storage pre-seeded with one value.
    pub fn with_value(key: &str, value: Vec<u8>) -> Self {
        let storage = Self::new();
        if let Ok(mut values) = storage.values.write() {
            values.insert(key.to_string(), value);
        }
        storage
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn save(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let mut values = self.values.write().map_err(lock_error)?;
        values.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn load(&self, key: &str) -> StorageResult<Vec<u8>> {
        let values = self.values.read().map_err(lock_error)?;
        values
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let mut values = self.values.write().map_err(lock_error)?;
        values.remove(key);
        Ok(())
    }

    fn list(&self) -> StorageResult<Vec<String>> {
        let values = self.values.read().map_err(lock_error)?;
        Ok(values.keys().cloned().collect())
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        let values = self.values.read().map_err(lock_error)?;
        Ok(values.contains_key(key))
    }
}

//! Key-value storage abstraction for persistence.
//!
//! The document controller writes the whole encoded document under a single
//! key after every mutation, so backends only need to deal in opaque blobs.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for key-value byte stores.
///
/// Implementations can keep values in memory or on the filesystem.
/// Every call completes before returning.
pub trait Storage: Send + Sync {
    /// Store a value, replacing any previous one.
    fn save(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Load a value.
    fn load(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Delete a value. Deleting a missing key succeeds.
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// List all keys.
    fn list(&self) -> StorageResult<Vec<String>>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> StorageResult<bool>;
}

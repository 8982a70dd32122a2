//! File-based storage implementation.

use super::{Storage, StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};

/// File-based storage.
///
/// Stores each value as a `.json` file in a base directory. File names are the
/// percent-encoded key, so distinct keys never share a file.
pub struct FileStorage {
    /// Base directory for stored values.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Linux: `~/.local/share/emojiart/`
    /// On macOS: `~/Library/Application Support/emojiart/`
    /// On Windows: `%LOCALAPPDATA%\emojiart\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("emojiart"))
    }

    /// Get the file path for a key.
    fn value_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", urlencoding::encode(key)))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn save(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let path = self.value_path(key);
        fs::write(&path, value)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }

    fn load(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.value_path(key);
        if !path.exists() {
            return Err(StorageError::NotFound(key.to_string()));
        }
        fs::read(&path)
            .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.value_path(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }

    fn list(&self) -> StorageResult<Vec<String>> {
        if !self.base_path.exists() {
            return Ok(vec![]);
        }

        let entries = fs::read_dir(&self.base_path)
            .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

        let mut keys = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // Skip files this storage could not have written.
            if let Ok(key) = urlencoding::decode(stem) {
                if urlencoding::encode(&key) == stem {
                    keys.push(key.into_owned());
                }
            }
        }
        Ok(keys)
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.value_path(key).exists())
    }
}

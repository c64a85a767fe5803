use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::TrackerError;

/// Synchronous string-keyed blob store local to this process
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, TrackerError>;

    fn set(&self, key: &str, value: &str) -> Result<(), TrackerError>;

    fn remove(&self, key: &str) -> Result<(), TrackerError>;
}

/// One file per key under a base directory
#[derive(Clone)]
pub struct FileCache {
    base_path: PathBuf,
}

impl FileCache {
    /// Create a cache with the default base directory ("./data")
    pub fn new() -> Self {
        Self {
            base_path: PathBuf::from("./data"),
        }
    }

    /// Create a cache with custom base directory
    pub fn new_with_base_dir(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the base directory path
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_path
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", file_name))
    }
}

impl Default for FileCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> Result<Option<String>, TrackerError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        Ok(Some(contents))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TrackerError> {
        fs::create_dir_all(&self.base_path)?;
        fs::write(self.key_path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TrackerError> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Process-local map, used when no directory is configured and in tests
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, TrackerError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TrackerError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TrackerError> {
        self.entries().remove(key);
        Ok(())
    }
}

//! Key/value configuration storage.
//!
//! The backend is chosen once at startup by [`open_default`]: a JSON file
//! under the platform config directory when it is writable, otherwise an
//! in-memory map that lives for the process.

use crate::config::ConfigError;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory name used under the platform config directory.
pub const APP_DIR: &str = "exam-proctor-agent";

/// Storage capability for configuration values.
pub trait ConfigStore: Send + Sync {
    /// Read a value, `None` when the key is unset.
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError>;

    /// Write a value.
    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError>;

    /// Remove a value. Removing an unset key is not an error.
    fn clear(&self, key: &str) -> Result<(), ConfigError>;

    /// Short name of the backend, for display.
    fn backend(&self) -> &'static str;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), ConfigError> {
        self.values.lock().remove(key);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Store backed by a single JSON object on disk.
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| ConfigError::Io(e.to_string()))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(values)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

impl ConfigStore for FileConfigStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let _guard = self.lock.lock();
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }

    fn clear(&self, key: &str) -> Result<(), ConfigError> {
        let _guard = self.lock.lock();
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

/// Pick the store backend for this process.
///
/// Order: file store at [`FileConfigStore::default_path`], then memory.
pub fn open_default() -> Box<dyn ConfigStore> {
    match FileConfigStore::default_path() {
        Some(path) => open_at(path),
        None => {
            warn!("No config directory on this platform; settings will not persist");
            Box::new(MemoryConfigStore::new())
        }
    }
}

/// Use a file store at `path` if its directory is writable, else memory.
pub fn open_at(path: PathBuf) -> Box<dyn ConfigStore> {
    let writable = path
        .parent()
        .map(|dir| std::fs::create_dir_all(dir).is_ok())
        .unwrap_or(false);

    if writable {
        debug!(path = %path.display(), "Using file config store");
        Box::new(FileConfigStore::new(path))
    } else {
        warn!(
            path = %path.display(),
            "Config directory not writable; settings will not persist"
        );
        Box::new(MemoryConfigStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join("exam-proctor-store-test")
            .join(format!("{}-{}.json", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryConfigStore::new();
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.clear("a").unwrap();
        store.clear("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let path = temp_store_path("persist");
        let store = FileConfigStore::new(path.clone());
        store.set("tick", "500").unwrap();
        store.set("cap", "12").unwrap();

        let reopened = FileConfigStore::new(path.clone());
        assert_eq!(reopened.get("tick").unwrap().as_deref(), Some("500"));

        reopened.clear("tick").unwrap();
        assert_eq!(store.get("tick").unwrap(), None);
        assert_eq!(store.get("cap").unwrap().as_deref(), Some("12"));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_open_at_prefers_file_store() {
        let store = open_at(temp_store_path("open"));
        assert_eq!(store.backend(), "file");
    }
}

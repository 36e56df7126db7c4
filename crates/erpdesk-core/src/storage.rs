//! A small persistent key/value store backed by one JSON file, playing the
//! role browser local storage plays for a web client.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Storage file name in the data directory
const STORAGE_FILE: &str = "local_storage.json";

#[derive(Debug)]
pub struct LocalStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl LocalStorage {
    /// Open the store in `data_dir`, reading any existing entries.
    /// A corrupt file is logged and treated as empty.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let path = data_dir.join(STORAGE_FILE);
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path).context("Failed to read local storage file")?;
            match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "Local storage file is corrupt; starting empty");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), keys = entries.len(), "Local storage opened");
        Ok(Self { path, entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        self.entries.insert(key.to_string(), value.into());
        self.persist()
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove_persist() {
        let dir = tempfile::tempdir().unwrap();

        let mut storage = LocalStorage::open(dir.path()).unwrap();
        assert_eq!(storage.get("theme"), None);
        storage.set("theme", "dark").unwrap();
        storage.set("isAuthenticated", "true").unwrap();
        storage.remove("theme").unwrap();

        let reopened = LocalStorage::open(dir.path()).unwrap();
        assert_eq!(reopened.path(), dir.path().join(STORAGE_FILE));
        assert_eq!(reopened.get("theme"), None);
        assert_eq!(reopened.get("isAuthenticated"), Some("true"));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STORAGE_FILE), "{not json").unwrap();

        let storage = LocalStorage::open(dir.path()).unwrap();
        assert_eq!(storage.get("user"), None);
    }
}

//! Per-application persisted key-value store
//!
//! One JSON object per application at `<data_dir>/<name>.ds`. The file is
//! created with `{"dsApp": "<name>"}` the first time it is needed, read fully
//! on first access, and rewritten fully on every set.

use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub struct DataStore {
    app: String,
    path: PathBuf,
    data: Option<Map<String, Value>>,
}

impl DataStore {
    pub fn new(app: &str, dir: &Path) -> Self {
        Self {
            app: app.to_string(),
            path: dir.join(format!("{app}.ds")),
            data: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn load(&mut self) -> Result<&mut Map<String, Value>, StoreError> {
        if self.data.is_none() {
            if !self.path.exists() {
                let mut fresh = Map::new();
                fresh.insert("dsApp".to_string(), Value::String(self.app.clone()));
                self.write(&fresh)?;
                tracing::debug!(app = %self.app, path = %self.path.display(), "Created data store");
            }
            let text = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
            let value: Value = serde_json::from_str(&text).map_err(|source| StoreError::Json {
                path: self.path.clone(),
                source,
            })?;
            let Value::Object(map) = value else {
                return Err(StoreError::NotAnObject {
                    path: self.path.clone(),
                });
            };
            self.data = Some(map);
        }
        Ok(self.data.get_or_insert_with(Map::new))
    }

    fn write(&self, data: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let text = serde_json::to_string_pretty(data).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, text).map_err(|e| self.io_error(e))
    }

    pub fn get(&mut self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.load()?.get(key).cloned())
    }

    /// Typed read; a value of the wrong shape reads as absent
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, StoreError> {
        Ok(self
            .get(key)?
            .and_then(|value| serde_json::from_value(value).ok()))
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), StoreError> {
        self.load()?.insert(key.to_string(), value.into());
        self.save()
    }

    pub fn remove(&mut self, key: &str) -> Result<Option<Value>, StoreError> {
        let removed = self.load()?.remove(key);
        if removed.is_some() {
            self.save()?;
        }
        Ok(removed)
    }

    fn save(&self) -> Result<(), StoreError> {
        match &self.data {
            Some(data) => self.write(data),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_store_created_lazily_with_app_marker() {
        let dir = TempDir::new().unwrap();
        let mut store = DataStore::new("notes", dir.path());
        assert!(!store.path().exists());

        assert_eq!(store.get("missing").unwrap(), None);
        assert!(store.path().exists());
        assert_eq!(store.get("dsApp").unwrap(), Some(json!("notes")));
    }

    #[test]
    fn test_set_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let mut store = DataStore::new("notes", dir.path());
        store.set("count", 3).unwrap();
        store.set("name", "x").unwrap();

        let on_disk: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("notes.ds")).unwrap()).unwrap();
        assert_eq!(on_disk, json!({"dsApp": "notes", "count": 3, "name": "x"}));

        let mut reopened = DataStore::new("notes", dir.path());
        assert_eq!(reopened.get_as::<u32>("count").unwrap(), Some(3));
        assert_eq!(reopened.get_as::<u32>("name").unwrap(), None);

        assert_eq!(reopened.remove("count").unwrap(), Some(json!(3)));
        assert_eq!(DataStore::new("notes", dir.path()).get("count").unwrap(), None);
    }

    #[test]
    fn test_corrupt_store_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.ds"), "not json").unwrap();
        let mut store = DataStore::new("bad", dir.path());
        assert!(matches!(store.get("k"), Err(StoreError::Json { .. })));

        fs::write(dir.path().join("list.ds"), "[1, 2]").unwrap();
        let mut store = DataStore::new("list", dir.path());
        assert!(matches!(store.get("k"), Err(StoreError::NotAnObject { .. })));
    }
}

// LibriSync - Audible Library Sync for Mobile
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! JSON flat-file key-value store
//!
//! The whole key space lives in a single JSON object. Every `set` rewrites the
//! file immediately so a crash never loses an acknowledged write: the object is
//! serialized to a sibling temp file which is then renamed over the original.
//!
//! # File Layout
//! ```json
//! {
//!   "user_volume": 80,
//!   "user_background": { "name": "White", "color": "#FFFFFF" },
//!   "user_library_books": [ { "marketId": "B07NP9L44Y", "title": "..." } ]
//! }
//! ```

use super::KeyValueStore;
use crate::error::{PrefsError, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key-value store persisted as one JSON document
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`
    ///
    /// A missing file is an empty store; nothing is written until the first
    /// `set`. Parent directories are created on open.
    ///
    /// # Errors
    /// Returns error if:
    /// - Parent directory can't be created
    /// - The file exists but can't be read
    /// - The file is not a JSON object
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    PrefsError::StorageError(format!(
                        "Failed to create settings directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let entries = if path.exists() {
            Self::read_entries(&path)?
        } else {
            Map::new()
        };

        log::debug!(
            "Opened JSON settings store at {} ({} keys)",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(path: &Path) -> Result<Map<String, Value>> {
        let contents = fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(map) => Ok(map),
            other => Err(PrefsError::StorageError(format!(
                "Settings file {} must contain a JSON object, found {}",
                path.display(),
                json_type_name(&other)
            ))),
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;

        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            PrefsError::StorageError(format!(
                "Failed to replace {} -> {}: {}",
                tmp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| PrefsError::poisoned("settings file"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| PrefsError::poisoned("settings file"))?;

        // On a failed write the in-memory view is rolled back to match the file.
        let previous = entries.insert(key.to_string(), value);
        if let Err(e) = self.write_entries(&entries) {
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }

        Ok(())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("user_volume").unwrap(), None);
        assert!(!path.exists(), "open must not create the file");
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set("user_voice", json!("Male Voice")).unwrap();
            store
                .set("user_background", json!({"name": "Sepia", "color": "#F4ECD8"}))
                .unwrap();
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("user_voice").unwrap(), Some(json!("Male Voice")));
        assert_eq!(
            reopened.get("user_background").unwrap(),
            Some(json!({"name": "Sepia", "color": "#F4ECD8"}))
        );
        assert!(!dir.path().join("nested").join("settings.json.tmp").exists());
    }

    #[test]
    fn test_non_object_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(err.to_string().contains("must contain a JSON object"));
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{\"user_volume\": ").unwrap();

        assert!(matches!(
            JsonFileStore::open(&path),
            Err(PrefsError::SerdeJsonError(_))
        ));
    }

    #[test]
    fn test_empty_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("user_speed").unwrap(), None);
    }
}

//! Storage configuration
//!
//! Picks the backend and where it lives. Values come from the caller or from
//! the environment:
//!
//! - `LIBRISYNC_PREFS_BACKEND`: `json` (default), `sqlite` or `memory`
//! - `LIBRISYNC_PREFS_PATH`: file location; defaults to the platform data
//!   directory
//!
//! # Default Location
//! - Desktop (macOS): ~/Library/Application Support/LibriSync/settings.{json,db}
//! - Desktop (Linux): ~/.local/share/LibriSync/settings.{json,db}
//! - Desktop (Windows): %APPDATA%/LibriSync/settings.{json,db}
//! - Android / iOS: the app should pass an explicit path

use crate::error::{PrefsError, Result};
use crate::storage::{JsonFileStore, KeyValueStore, MemoryStore, SqliteStore};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const BACKEND_ENV: &str = "LIBRISYNC_PREFS_BACKEND";
pub const PATH_ENV: &str = "LIBRISYNC_PREFS_PATH";

const APP_DIR: &str = "LibriSync";

/// Which key-value backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    Memory,
    #[default]
    JsonFile,
    Sqlite,
}

impl BackendKind {
    /// File name used when no explicit path is configured
    pub fn default_file_name(&self) -> Option<&'static str> {
        match self {
            BackendKind::Memory => None,
            BackendKind::JsonFile => Some("settings.json"),
            BackendKind::Sqlite => Some("settings.db"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = PrefsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "json" => Ok(BackendKind::JsonFile),
            "sqlite" => Ok(BackendKind::Sqlite),
            other => Err(PrefsError::InvalidConfiguration(format!(
                "Unknown storage backend '{}' (expected json, sqlite or memory)",
                other
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Memory => "memory",
            BackendKind::JsonFile => "json",
            BackendKind::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}

/// Backend selection and location
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreConfig {
    pub backend: BackendKind,
    /// Explicit file location; `None` uses the platform default
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn new(backend: BackendKind) -> Self {
        Self { backend, path: None }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Build from `LIBRISYNC_PREFS_BACKEND` / `LIBRISYNC_PREFS_PATH`
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` for an unknown backend name.
    pub fn from_env() -> Result<Self> {
        let backend = match std::env::var(BACKEND_ENV) {
            Ok(value) if !value.trim().is_empty() => value.parse()?,
            _ => BackendKind::default(),
        };
        let path = std::env::var_os(PATH_ENV)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Ok(Self { backend, path })
    }

    /// Configured path, else the platform default; `None` for memory
    pub fn resolved_path(&self) -> Option<PathBuf> {
        let file_name = self.backend.default_file_name()?;
        Some(
            self.path
                .clone()
                .unwrap_or_else(|| default_data_dir().join(file_name)),
        )
    }

    /// Open the configured backend
    pub fn open_storage(&self) -> Result<Box<dyn KeyValueStore>> {
        open_storage(self)
    }
}

/// Open the backend described by `config`
pub fn open_storage(config: &StoreConfig) -> Result<Box<dyn KeyValueStore>> {
    log::debug!(
        "Opening {} settings store at {:?}",
        config.backend,
        config.resolved_path()
    );

    match (config.backend, config.resolved_path()) {
        (BackendKind::Memory, _) => Ok(Box::new(MemoryStore::new())),
        (BackendKind::JsonFile, Some(path)) => Ok(Box::new(JsonFileStore::open(path)?)),
        (BackendKind::Sqlite, Some(path)) => Ok(Box::new(SqliteStore::open(path)?)),
        (kind, None) => Err(PrefsError::InvalidConfiguration(format!(
            "No path for {} backend",
            kind
        ))),
    }
}

/// Platform application data directory for LibriSync
pub fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join("Library")
            .join("Application Support")
            .join(APP_DIR)
    }

    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".local").join("share").join(APP_DIR)
    }

    #[cfg(target_os = "windows")]
    {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join(APP_DIR)
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        // Mobile hosts hand in their sandbox path explicitly
        PathBuf::from(".").join(APP_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_backend_parsing() {
        assert_eq!("json".parse::<BackendKind>().unwrap(), BackendKind::JsonFile);
        assert_eq!(" SQLite ".parse::<BackendKind>().unwrap(), BackendKind::Sqlite);
        assert_eq!("memory".parse::<BackendKind>().unwrap(), BackendKind::Memory);

        let err = "redis".parse::<BackendKind>().unwrap_err();
        assert!(matches!(err, PrefsError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_display_matches_parse() {
        for kind in [BackendKind::Memory, BackendKind::JsonFile, BackendKind::Sqlite] {
            assert_eq!(kind.to_string().parse::<BackendKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_resolved_path() {
        let explicit = StoreConfig::new(BackendKind::Sqlite).with_path("/tmp/prefs.db");
        assert_eq!(explicit.resolved_path(), Some(PathBuf::from("/tmp/prefs.db")));

        let default = StoreConfig::default().resolved_path().unwrap();
        assert!(default.ends_with("settings.json"));
        assert!(default.to_string_lossy().contains(APP_DIR));

        assert_eq!(StoreConfig::new(BackendKind::Memory).resolved_path(), None);
    }

    #[test]
    fn test_open_each_backend() {
        let dir = TempDir::new().unwrap();

        let configs = [
            StoreConfig::new(BackendKind::Memory),
            StoreConfig::new(BackendKind::JsonFile).with_path(dir.path().join("s.json")),
            StoreConfig::new(BackendKind::Sqlite).with_path(dir.path().join("s.db")),
        ];

        for config in configs {
            let storage = config.open_storage().unwrap();
            storage.set("user_speed", json!(1.5)).unwrap();
            assert_eq!(storage.get("user_speed").unwrap(), Some(json!(1.5)));
        }
    }
}

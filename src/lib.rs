//! LibriSync user preferences
//!
//! Persists reader/player preferences and the saved-book library to a
//! key-value backend, plus a timer-based animation frame fallback.

pub mod config;
pub mod error;
pub mod frame;
pub mod settings;
pub mod storage;

pub use config::{BackendKind, StoreConfig};
pub use error::{PrefsError, Result};
pub use frame::{FrameHandle, FrameScheduler};
pub use settings::{Background, LibraryBook, MarketId, PreferenceSet, SettingsStore};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, SqliteStore};

/// Open a [`SettingsStore`] over the backend described by the environment
///
/// See [`StoreConfig::from_env`].
pub fn open_from_env() -> Result<SettingsStore<Box<dyn KeyValueStore>>> {
    let config = StoreConfig::from_env()?;
    Ok(SettingsStore::new(config.open_storage()?))
}

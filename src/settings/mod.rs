// LibriSync - Audible Library Sync for Mobile
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! User preferences and saved library
//!
//! [`SettingsStore`] is a stateless façade over a [`KeyValueStore`]: every call
//! round-trips through the backend, nothing is cached.
//!
//! # Defaults
//! A key that was never written reads back as its default value. A missing key
//! is never an error.
//!
//! # Usage Example
//! ```no_run
//! use librisync_prefs::settings::{LibraryBook, SettingsStore};
//! use librisync_prefs::storage::JsonFileStore;
//!
//! # fn example() -> librisync_prefs::error::Result<()> {
//! let store = SettingsStore::new(JsonFileStore::open("./settings.json")?);
//!
//! store.save_volume(65)?;
//! assert_eq!(store.get_settings().volume, 65);
//!
//! let book = LibraryBook::new("B07NP9L44Y").with_field("title", "A Mind of Her Own");
//! store.add_book_to_library(book)?;
//! assert!(store.is_book_in_library("B07NP9L44Y")?);
//! # Ok(())
//! # }
//! ```

pub mod keys;
mod library;
pub mod models;

pub use models::{Background, LibraryBook, MarketId, PreferenceSet};

use crate::error::{PrefsError, Result};
use crate::storage::KeyValueStore;
use keys::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Mutex;

/// Preferences and library façade over a key-value backend
#[derive(Debug)]
pub struct SettingsStore<S> {
    storage: S,
    /// Serializes library read-modify-write cycles
    library_lock: Mutex<()>,
}

impl<S: KeyValueStore> SettingsStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            library_lock: Mutex::new(()),
        }
    }

    /// Borrow the underlying backend
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Give the backend back
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Read every preference, substituting defaults
    ///
    /// Never fails: a missing key, an undecodable value, or a backend read
    /// error all yield the default for that field.
    pub fn get_settings(&self) -> PreferenceSet {
        let defaults = PreferenceSet::default();

        PreferenceSet {
            volume: self.read_or_default(VOLUME_KEY, defaults.volume),
            voice: self.read_or_default(VOICE_KEY, defaults.voice),
            font_size: self.read_or_default(FONT_SIZE_KEY, defaults.font_size),
            speed: self.read_or_default(SPEED_KEY, defaults.speed),
            background: self.read_or_default(BACKGROUND_KEY, defaults.background),
            listening_mode: self.read_or_default(LISTENING_MODE_KEY, defaults.listening_mode),
            reading_time_seconds: self.get_reading_time().unwrap_or_else(|e| {
                log::warn!("Failed to read '{}', using default: {}", READING_TIME_KEY, e);
                defaults.reading_time_seconds
            }),
        }
    }

    /// Persist every field of `prefs`, one key at a time
    ///
    /// Not atomic: stops at the first failing write.
    pub fn save_settings(&self, prefs: &PreferenceSet) -> Result<()> {
        self.save_volume(prefs.volume)?;
        self.save_voice(&prefs.voice)?;
        self.save_font_size(prefs.font_size)?;
        self.save_speed(prefs.speed)?;
        self.save_background(&prefs.background)?;
        self.save_listening_mode(&prefs.listening_mode)?;
        self.update_reading_time(prefs.reading_time_seconds)
    }

    /// Values above 100 are stored as given
    pub fn save_volume(&self, volume: u32) -> Result<()> {
        self.write(VOLUME_KEY, &volume)
    }

    pub fn save_voice(&self, voice: &str) -> Result<()> {
        self.write(VOICE_KEY, &voice)
    }

    pub fn save_font_size(&self, font_size: f64) -> Result<()> {
        self.write(FONT_SIZE_KEY, &font_size)
    }

    pub fn save_speed(&self, speed: f64) -> Result<()> {
        self.write(SPEED_KEY, &speed)
    }

    pub fn save_background(&self, background: &Background) -> Result<()> {
        self.write(BACKGROUND_KEY, background)
    }

    pub fn save_listening_mode(&self, mode: &str) -> Result<()> {
        self.write(LISTENING_MODE_KEY, &mode)
    }

    /// Total reading time in seconds, 0 if never recorded
    ///
    /// A fractional stored total is truncated to whole seconds.
    pub fn get_reading_time(&self) -> Result<u64> {
        Ok(self
            .storage
            .get(READING_TIME_KEY)?
            .map(decode_reading_time)
            .unwrap_or(0))
    }

    /// Overwrite the stored total; the caller passes the new absolute value
    pub fn update_reading_time(&self, total_seconds: u64) -> Result<()> {
        self.write(READING_TIME_KEY, &total_seconds)
    }

    fn read_or_default<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.storage.get(key) {
            Ok(Some(value)) => decode_or_default(key, value, default),
            Ok(None) => default,
            Err(e) => {
                log::warn!("Failed to read '{}', using default: {}", key, e);
                default
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        log::debug!("Saving {} = {}", key, value);
        self.storage.set(key, value)
    }

    fn lock_library(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.library_lock
            .lock()
            .map_err(|_| PrefsError::poisoned("library"))
    }
}

fn decode_or_default<T: DeserializeOwned>(key: &str, value: serde_json::Value, default: T) -> T {
    serde_json::from_value(value).unwrap_or_else(|e| {
        log::warn!("Stored value for '{}' is invalid, using default: {}", key, e);
        default
    })
}

fn decode_reading_time(value: serde_json::Value) -> u64 {
    if let Some(seconds) = value.as_u64() {
        return seconds;
    }
    match value.as_f64() {
        Some(seconds) if seconds.is_finite() && seconds >= 0.0 => seconds.trunc() as u64,
        _ => {
            log::warn!("Stored value for '{}' is invalid, using 0: {}", READING_TIME_KEY, value);
            0
        }
    }
}

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


//! Key-value storage backends
//!
//! The preferences façade only needs two synchronous primitives from its
//! backend: read a JSON value by key, and write one. Any durable key space
//! satisfies that contract; this module ships three.
//!
//! # Backends
//! - [`MemoryStore`]: `HashMap` behind a mutex, for tests and throwaway state
//! - [`JsonFileStore`]: the whole key space as one JSON object on disk,
//!   rewritten on every `set`
//! - [`SqliteStore`]: a `kv_store` table in SQLite, driven through sqlx
//!
//! # Usage Example
//! ```no_run
//! use librisync_prefs::storage::{JsonFileStore, KeyValueStore};
//!
//! # fn example() -> librisync_prefs::error::Result<()> {
//! let store = JsonFileStore::open("./settings.json")?;
//! store.set("user_volume", serde_json::json!(65))?;
//! assert_eq!(store.get("user_volume")?, Some(serde_json::json!(65)));
//! # Ok(())
//! # }
//! ```

pub mod json_file;
pub mod memory;
pub mod migrations;
pub mod sqlite;

use crate::error::Result;
use serde_json::Value;
use std::sync::Arc;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Synchronous key-value durability primitive
///
/// `get` returns `Ok(None)` for a key that was never written; that is not an
/// error. Backend failures are reported through `Err` and are passed through
/// the façade untouched.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing whatever was there
    fn set(&self, key: &str, value: Value) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        (**self).set(key, value)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        (**self).set(key, value)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        (**self).set(key, value)
    }
}

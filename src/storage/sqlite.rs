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


//! SQLite-backed key-value store
//!
//! Values are kept as JSON text in the `kv_store` table. sqlx is async, while
//! the preferences contract is synchronous, so each store owns a private
//! current-thread Tokio runtime and blocks on it for every call.
//!
//! # Threading
//! A `SqliteStore` must not be used from inside an async task (Tokio panics when
//! a runtime is blocked on from within another one). Call it from a plain
//! thread or from `tokio::task::spawn_blocking`.
//!
//! # SQLite Configuration
//! - WAL mode for file databases
//! - Normal synchronous mode (balance safety/speed)
//! - In-memory databases keep their single connection alive for the lifetime
//!   of the store

use super::KeyValueStore;
use crate::error::{PrefsError, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    ConnectOptions,
};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

/// Key-value store persisted in an SQLite database
#[derive(Debug)]
pub struct SqliteStore {
    // Declared before the runtime so the pool is released while it still exists.
    pool: SqlitePool,
    runtime: Runtime,
    path: Option<PathBuf>, // None for in-memory databases
}

impl SqliteStore {
    /// Open (or create) the database at `database_path` and run migrations
    ///
    /// # Errors
    /// Returns error if:
    /// - Parent directory doesn't exist and can't be created
    /// - Database file can't be opened
    /// - Migrations fail
    pub fn open<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let path = database_path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PrefsError::StorageError(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let runtime = Self::build_runtime()?;

        let connection_string = format!("sqlite://{}?mode=rwc", path.display());
        let connect_opts = SqliteConnectOptions::from_str(&connection_string)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30))
            .disable_statement_logging();

        let pool = runtime.block_on(
            SqlitePoolOptions::new()
                .max_connections(2)
                .acquire_timeout(Duration::from_secs(30))
                .connect_with(connect_opts),
        )?;

        let store = Self {
            pool,
            runtime,
            path: Some(path.to_path_buf()),
        };
        store.migrate()?;

        log::debug!("Opened SQLite settings store at {}", path.display());

        Ok(store)
    }

    /// Create an in-memory store for testing
    pub fn open_in_memory() -> Result<Self> {
        let runtime = Self::build_runtime()?;

        let connect_opts = SqliteConnectOptions::from_str("sqlite::memory:")?
            .disable_statement_logging();

        // Every connection to `sqlite::memory:` is a separate database, so the
        // pool is pinned to one connection that is never reaped.
        let pool = runtime.block_on(
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(connect_opts),
        )?;

        let store = Self {
            pool,
            runtime,
            path: None,
        };
        store.migrate()?;

        Ok(store)
    }

    /// Database file path; `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Timestamp of the last write to `key`
    pub fn updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self.block_on(
            sqlx::query_scalar("SELECT updated_at FROM kv_store WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool),
        )?;

        raw.map(|text| {
            DateTime::parse_from_rfc3339(&text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| PrefsError::invalid_data(key, format!("bad updated_at: {}", e)))
        })
        .transpose()
    }

    /// Close the database and release all connections
    pub fn close(self) -> Result<()> {
        self.block_on(self.pool.close());
        Ok(())
    }

    fn migrate(&self) -> Result<()> {
        self.block_on(super::migrations::run_migrations(&self.pool))
            .map_err(|e| PrefsError::MigrationFailed(e.to_string()))
    }

    fn build_runtime() -> Result<Runtime> {
        Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| PrefsError::StorageError(format!("Failed to create Tokio runtime: {}", e)))
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self.block_on(
            sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool),
        )?;

        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let text = serde_json::to_string(&value)?;
        let now = Utc::now().to_rfc3339();

        self.block_on(
            sqlx::query(
                r#"
                INSERT INTO kv_store (key, value, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(key)
            .bind(&text)
            .bind(&now)
            .execute(&self.pool),
        )?;

        Ok(())
    }
}

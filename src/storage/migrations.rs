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


//! Schema setup for [`SqliteStore`](super::SqliteStore)
//!
//! There is one migration, `1 kv_store`, which creates the `kv_store` table.
//! It is plain SQL run when the store opens and recorded in `_migrations`, so
//! reopening an existing database leaves the table alone.
//!
//! Only the table is versioned. The JSON stored in `value` belongs to the
//! preferences layer.

use crate::error::Result;
use sqlx::{Executor, SqlitePool};

/// Bring the database up to the `kv_store` schema
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    create_migrations_table(pool).await?;

    run_migration(pool, 1, "kv_store", create_kv_table(pool)).await?;

    Ok(())
}

/// `_migrations` records the id and name of every applied step
async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .await?;

    Ok(())
}

/// Apply step `id` unless `_migrations` already lists it
async fn run_migration(
    pool: &SqlitePool,
    id: i32,
    name: &str,
    migration_fn: impl std::future::Future<Output = Result<()>>,
) -> Result<()> {
    let applied: Option<i32> = sqlx::query_scalar("SELECT id FROM _migrations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    if applied.is_some() {
        return Ok(());
    }

    migration_fn.await?;

    sqlx::query("INSERT INTO _migrations (id, name) VALUES (?, ?)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;

    log::debug!("Applied storage migration {} ({})", id, name);

    Ok(())
}

/// Key space table: one row per key, value stored as JSON text
async fn create_kv_table(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,      -- serialized JSON value
    updated_at TEXT NOT NULL  -- RFC 3339 UTC timestamp of the last write
);
        "#,
    )
    .await?;

    Ok(())
}

// Folio - Offline Document Reader
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


//! Database migrations
//!
//! This module handles database schema creation and migrations.
//!
//! # Migration Strategy
//! Since sqlx's compile-time migration system requires a build-time database
//! connection, migrations run as plain SQL at open time. Applied migrations
//! are recorded in the `_migrations` table; an upgrade only ever adds tables
//! and indexes, existing rows are never touched. Running the whole set again
//! is a no-op.

use crate::error::Result;
use sqlx::{Executor, SqlitePool};

/// Run all database migrations
///
/// This function creates the database schema and applies any pending
/// migrations. Migrations are tracked in the `_migrations` table.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Create migrations tracking table
    create_migrations_table(pool).await?;

    // Run all migrations in order
    run_migration(pool, 1, "initial_schema", create_initial_schema(pool)).await?;
    run_migration(pool, 2, "annotations", create_annotations_schema(pool)).await?;

    Ok(())
}

/// Create migrations tracking table
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

/// Run a single migration if it hasn't been applied yet
async fn run_migration(
    pool: &SqlitePool,
    id: i32,
    name: &str,
    migration_fn: impl std::future::Future<Output = Result<()>>,
) -> Result<()> {
    // Check if migration has been applied
    let applied: Option<i32> = sqlx::query_scalar("SELECT id FROM _migrations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    if applied.is_some() {
        // Migration already applied
        return Ok(());
    }

    log::debug!("applying migration {} ({})", id, name);
    migration_fn.await?;

    // Record migration
    sqlx::query("INSERT INTO _migrations (id, name) VALUES (?, ?)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Create initial database schema
///
/// One table holds both the document payload and its reading metadata, so a
/// record can never exist in a metadata-without-content state.
async fn create_initial_schema(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
-- Documents table: stored files plus reading metadata
--
-- doc_id is synthesized at save time (epoch millis + random suffix), never
-- reused. reading_progress / last_read_page / last_read_at always change
-- together in a single UPDATE; last_read_at stays NULL until the first
-- progress update.
CREATE TABLE IF NOT EXISTS Documents (
    doc_id TEXT PRIMARY KEY,

    -- Immutable attributes copied from the source file
    name TEXT NOT NULL,
    size INTEGER NOT NULL,            -- bytes, as reported by the source
    mime_type TEXT NOT NULL,
    last_modified INTEGER NOT NULL,   -- epoch milliseconds

    -- Set at creation
    uploaded_at TEXT NOT NULL,        -- ISO 8601 timestamp

    -- Payload, immutable after insert
    data BLOB NOT NULL,

    -- Reading metadata, mutable
    reading_progress REAL NOT NULL DEFAULT 0.0,
    last_read_page INTEGER NOT NULL DEFAULT 1,
    last_read_at TEXT                 -- NULL until first progress update
);

-- Listing and usage aggregation never touch the payload column; these
-- indexes keep the common sort keys cheap.
CREATE INDEX IF NOT EXISTS idx_documents_name ON Documents(name);
CREATE INDEX IF NOT EXISTS idx_documents_uploaded_at ON Documents(uploaded_at);
CREATE INDEX IF NOT EXISTS idx_documents_size ON Documents(size);
        "#,
    )
    .await?;

    Ok(())
}

/// Add per-document annotation storage
///
/// Annotations are an opaque JSON body owned by the reading UI; the store
/// only guarantees they disappear with their document.
async fn create_annotations_schema(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
CREATE TABLE IF NOT EXISTS Annotations (
    doc_id TEXT PRIMARY KEY,
    body TEXT NOT NULL,               -- opaque JSON
    updated_at TEXT NOT NULL,         -- ISO 8601 timestamp
    FOREIGN KEY (doc_id) REFERENCES Documents(doc_id) ON DELETE CASCADE
);
        "#,
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::database::Database;

    #[tokio::test]
    async fn test_migrations() {
        let db = Database::in_memory()
            .await
            .expect("Failed to create database");

        // Verify tables exist
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_migrations' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .expect("Failed to query tables");

        let expected_tables = vec!["Annotations", "Documents"];

        assert_eq!(tables, expected_tables, "Missing or extra tables");
    }

    #[tokio::test]
    async fn test_migration_tracking() {
        let db = Database::in_memory()
            .await
            .expect("Failed to create database");

        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM _migrations ORDER BY id")
                .fetch_all(db.pool())
                .await
                .expect("Failed to query migrations");

        assert_eq!(names, vec!["initial_schema", "annotations"]);
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let db = Database::in_memory()
            .await
            .expect("Failed to create database");

        // Running the full set again must not fail or duplicate records
        run_migrations(db.pool())
            .await
            .expect("Re-running migrations failed");
        run_migrations(db.pool())
            .await
            .expect("Re-running migrations failed");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _migrations")
            .fetch_one(db.pool())
            .await
            .expect("Failed to query migrations");

        assert_eq!(count, 2, "Duplicate migration records");
    }

    #[tokio::test]
    async fn test_upgrade_preserves_existing_rows() {
        use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
        use std::str::FromStr;

        // Build a database frozen at schema version 1
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .expect("Bad connection string")
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .expect("Failed to connect");

        create_migrations_table(&pool).await.expect("Failed to create tracking table");
        run_migration(&pool, 1, "initial_schema", create_initial_schema(&pool))
            .await
            .expect("Failed to apply v1");

        sqlx::query(
            "INSERT INTO Documents (doc_id, name, size, mime_type, last_modified, uploaded_at, data)
             VALUES ('1700000000000_abc123def', 'doc.pdf', 3, 'application/pdf', 0, '2024-01-01T00:00:00Z', X'010203')",
        )
        .execute(&pool)
        .await
        .expect("Failed to insert v1 row");

        // Upgrading to the current version must keep the row intact
        run_migrations(&pool).await.expect("Upgrade failed");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Documents")
            .fetch_one(&pool)
            .await
            .expect("Failed to count documents");
        assert_eq!(count, 1, "Upgrade lost existing records");

        let has_annotations: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='Annotations'",
        )
        .fetch_one(&pool)
        .await
        .expect("Failed to check Annotations table");
        assert_eq!(has_annotations, 1, "Upgrade did not add Annotations");
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = Database::in_memory()
            .await
            .expect("Failed to create database");

        let fk_enabled: i32 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .expect("Failed to check foreign keys");

        assert_eq!(fk_enabled, 1, "Foreign keys not enabled");
    }
}

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


//! Document record store
//!
//! [`DocumentStore`] is the single owner of persisted documents. It is
//! constructed by the application's composition root and shared by reference;
//! there is no global handle. The underlying database opens lazily on the
//! first operation and is reused for the lifetime of the store.
//!
//! # Contract
//! - `save` synthesizes a fresh id and never overwrites an existing record
//! - `get_all` returns metadata only; payload bytes never travel with a listing
//! - `update_progress` sets progress, page, and timestamp in one statement,
//!   so a reader can never observe a new page paired with stale progress
//! - `delete` is idempotent; deleting an absent id succeeds
//! - every engine failure surfaces to the caller; nothing is retried here

use crate::error::{FolioError, Result};
use crate::store::database::{Database, StoreConfig};
use crate::store::models::{
    DocumentRecord, NewDocument, RetrievedDocument, SourceFile, StorageUsage, StoredDocument,
};
use chrono::Utc;
use sqlx::SqlitePool;
use std::path::PathBuf;
use tokio::sync::OnceCell;

/// Persistent store of document payloads and reading metadata
///
/// Cheap to construct; the first operation opens the database (creating the
/// file and running migrations as needed) and caches the handle.
#[derive(Debug)]
pub struct DocumentStore {
    config: Option<StoreConfig>, // None for in-memory stores
    db: OnceCell<Database>,
}

impl DocumentStore {
    /// Create a store backed by a database file at `database_path`
    ///
    /// No I/O happens here; the file is opened on first use.
    pub fn new<P: Into<PathBuf>>(database_path: P) -> Self {
        Self::with_config(StoreConfig {
            database_path: database_path.into(),
            ..StoreConfig::default()
        })
    }

    /// Create a store with explicit pool configuration
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config: Some(config),
            db: OnceCell::new(),
        }
    }

    /// Create a store backed by an in-memory database (for tests)
    pub fn in_memory() -> Self {
        Self {
            config: None,
            db: OnceCell::new(),
        }
    }

    /// Get the underlying database, opening it on first call
    pub async fn database(&self) -> Result<&Database> {
        self.db
            .get_or_try_init(|| async {
                match &self.config {
                    Some(config) => Database::open_with(config).await,
                    None => Database::in_memory().await,
                }
            })
            .await
    }

    async fn pool(&self) -> Result<&SqlitePool> {
        Ok(self.database().await?.pool())
    }

    /// Persist a new document, returning its freshly assigned id
    ///
    /// Attributes are copied from the source file verbatim; reading metadata
    /// starts at progress 0, page 1. Ids never collide by construction, so
    /// an insert conflict is an engine fault, not an overwrite.
    pub async fn save(&self, source: SourceFile) -> Result<String> {
        let pool = self.pool().await?;
        let doc = NewDocument::from_source(source);

        sqlx::query(
            r#"
            INSERT INTO Documents (
                doc_id, name, size, mime_type, last_modified, uploaded_at, data
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&doc.doc_id)
        .bind(&doc.name)
        .bind(doc.size)
        .bind(&doc.mime_type)
        .bind(doc.last_modified)
        .bind(doc.uploaded_at)
        .bind(&doc.data)
        .execute(pool)
        .await?;

        log::debug!("saved document {} ({} bytes)", doc.doc_id, doc.size);
        Ok(doc.doc_id)
    }

    /// List every record, payload excluded
    ///
    /// No ordering guarantee is made; callers needing a specific order sort
    /// explicitly (see the library view).
    pub async fn get_all(&self) -> Result<Vec<DocumentRecord>> {
        let pool = self.pool().await?;
        let records = sqlx::query_as::<_, DocumentRecord>(
            r#"
            SELECT doc_id, name, size, mime_type, last_modified, uploaded_at,
                   reading_progress, last_read_page, last_read_at
            FROM Documents
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Fetch one document by id, reconstructing the file from its payload
    ///
    /// Rebuilds the file-like value on every call; nothing is cached.
    pub async fn get_by_id(&self, doc_id: &str) -> Result<RetrievedDocument> {
        let pool = self.pool().await?;
        let doc = sqlx::query_as::<_, StoredDocument>("SELECT * FROM Documents WHERE doc_id = ?")
            .bind(doc_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| FolioError::not_found(doc_id))?;

        let (file, record) = doc.into_parts();
        Ok(RetrievedDocument { file, record })
    }

    /// Overwrite reading progress for one document
    ///
    /// Progress, page, and the last-read timestamp change together in a
    /// single UPDATE, so concurrent updates to the same id serialize at the
    /// engine and different ids never interfere. The value itself is not
    /// validated; the last completed write wins.
    pub async fn update_progress(&self, doc_id: &str, progress: f64, page: i64) -> Result<()> {
        let pool = self.pool().await?;
        let result = sqlx::query(
            r#"
            UPDATE Documents
            SET reading_progress = ?, last_read_page = ?, last_read_at = ?
            WHERE doc_id = ?
            "#,
        )
        .bind(progress)
        .bind(page)
        .bind(Utc::now())
        .bind(doc_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(FolioError::not_found(doc_id));
        }

        Ok(())
    }

    /// Remove one document (and its annotations, via cascade)
    ///
    /// Idempotent: removing an id that is already gone succeeds. Only an
    /// engine failure is an error.
    pub async fn delete(&self, doc_id: &str) -> Result<()> {
        let pool = self.pool().await?;
        let result = sqlx::query("DELETE FROM Documents WHERE doc_id = ?")
            .bind(doc_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            log::debug!("delete of absent document {} was a no-op", doc_id);
        }

        Ok(())
    }

    /// Remove every record unconditionally. Irreversible.
    pub async fn clear_all(&self) -> Result<()> {
        let pool = self.pool().await?;

        // Delete in order that respects foreign keys
        sqlx::query("DELETE FROM Annotations").execute(pool).await?;
        sqlx::query("DELETE FROM Documents").execute(pool).await?;

        log::debug!("cleared all documents");
        Ok(())
    }

    /// Aggregate storage statistics
    ///
    /// Sums the stored `size` attribute of every record. This is the size the
    /// sources reported at save time, not payload length inspection and not
    /// the database's on-disk footprint.
    pub async fn storage_usage(&self) -> Result<StorageUsage> {
        let pool = self.pool().await?;
        let (total_bytes, file_count): (Option<i64>, i64) =
            sqlx::query_as("SELECT SUM(size), COUNT(*) FROM Documents")
                .fetch_one(pool)
                .await?;

        Ok(StorageUsage {
            total_bytes: total_bytes.unwrap_or(0),
            file_count,
        })
    }

    /// Close the store, waiting for in-flight operations to finish
    ///
    /// A store that was never used closes without ever opening the database.
    pub async fn close(self) -> Result<()> {
        if let Some(db) = self.db.into_inner() {
            db.close().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pdf(name: &str, bytes: usize) -> SourceFile {
        SourceFile::new(name, "application/pdf", 1_700_000_000_000, vec![0x25; bytes])
    }

    #[tokio::test]
    async fn test_save_and_get_by_id_round_trip() {
        let store = DocumentStore::in_memory();

        let source = SourceFile::new(
            "doc.pdf",
            "application/pdf",
            1_700_000_000_000,
            vec![0x25, 0x50, 0x44, 0x46],
        );
        let id = store.save(source.clone()).await.expect("Failed to save");

        let retrieved = store.get_by_id(&id).await.expect("Failed to fetch");
        assert_eq!(retrieved.file.data, source.data);
        assert_eq!(retrieved.file.name, "doc.pdf");
        assert_eq!(retrieved.file.mime_type, "application/pdf");
        assert_eq!(retrieved.record.doc_id, id);
    }

    #[tokio::test]
    async fn test_save_assigns_unique_ids() {
        let store = DocumentStore::in_memory();

        // Identical files saved in rapid succession must still get distinct ids
        let mut ids = Vec::new();
        for _ in 0..20 {
            let id = store.save(sample_pdf("same.pdf", 16)).await.expect("Failed to save");
            ids.push(id);
        }

        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len(), "ids collided");
    }

    #[tokio::test]
    async fn test_save_initializes_reading_metadata() {
        let store = DocumentStore::in_memory();

        let id = store.save(sample_pdf("fresh.pdf", 8)).await.expect("Failed to save");
        let retrieved = store.get_by_id(&id).await.expect("Failed to fetch");

        assert_eq!(retrieved.record.reading_progress, 0.0);
        assert_eq!(retrieved.record.last_read_page, 1);
        assert!(retrieved.record.last_read_at.is_none());
        assert!(!retrieved.record.has_been_read());
    }

    #[tokio::test]
    async fn test_get_all_returns_metadata_for_every_record() {
        let store = DocumentStore::in_memory();

        let id_a = store.save(sample_pdf("a.pdf", 100)).await.expect("Failed to save");
        let id_b = store.save(sample_pdf("b.pdf", 200)).await.expect("Failed to save");

        let mut records = store.get_all().await.expect("Failed to list");
        records.sort_by(|x, y| x.name.cmp(&y.name));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].doc_id, id_a);
        assert_eq!(records[0].size, 100);
        assert_eq!(records[1].doc_id, id_b);
        assert_eq!(records[1].size, 200);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let store = DocumentStore::in_memory();

        let err = store.get_by_id("nonexistent").await.unwrap_err();
        assert!(err.is_not_found(), "expected not-found, got {:?}", err);
    }

    #[tokio::test]
    async fn test_update_progress_pairs_fields() {
        let store = DocumentStore::in_memory();
        let id = store.save(sample_pdf("read.pdf", 64)).await.expect("Failed to save");

        store
            .update_progress(&id, 45.5, 10)
            .await
            .expect("Failed to update progress");

        let retrieved = store.get_by_id(&id).await.expect("Failed to fetch");
        assert_eq!(retrieved.record.reading_progress, 45.5);
        assert_eq!(retrieved.record.last_read_page, 10);
        assert!(retrieved.record.last_read_at.is_some());
    }

    #[tokio::test]
    async fn test_update_progress_visible_in_listing() {
        let store = DocumentStore::in_memory();
        let id = store.save(sample_pdf("listed.pdf", 64)).await.expect("Failed to save");

        store
            .update_progress(&id, 45.5, 10)
            .await
            .expect("Failed to update progress");

        let records = store.get_all().await.expect("Failed to list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].reading_progress, 45.5);
        assert_eq!(records[0].last_read_page, 10);
    }

    #[tokio::test]
    async fn test_update_progress_not_found() {
        let store = DocumentStore::in_memory();

        let err = store.update_progress("nonexistent", 10.0, 2).await.unwrap_err();
        assert!(err.is_not_found(), "expected not-found, got {:?}", err);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = DocumentStore::in_memory();

        // Deleting an id that never existed is a successful no-op
        store.delete("nonexistent").await.expect("delete errored on absent id");

        let id = store.save(sample_pdf("gone.pdf", 8)).await.expect("Failed to save");
        store.delete(&id).await.expect("Failed to delete");
        store.delete(&id).await.expect("second delete errored");
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_one() {
        let store = DocumentStore::in_memory();

        let id_a = store.save(sample_pdf("first.pdf", 10)).await.expect("Failed to save");
        let id_b = store.save(sample_pdf("second.pdf", 20)).await.expect("Failed to save");

        store.delete(&id_a).await.expect("Failed to delete");

        let records = store.get_all().await.expect("Failed to list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].doc_id, id_b);
        assert_eq!(records[0].name, "second.pdf");
    }

    #[tokio::test]
    async fn test_storage_usage_sums_sizes() {
        let store = DocumentStore::in_memory();

        assert_eq!(
            store.storage_usage().await.expect("Failed to get usage"),
            StorageUsage { total_bytes: 0, file_count: 0 }
        );

        store.save(sample_pdf("a.pdf", 100)).await.expect("Failed to save");
        store.save(sample_pdf("b.pdf", 250)).await.expect("Failed to save");

        let usage = store.storage_usage().await.expect("Failed to get usage");
        assert_eq!(usage.total_bytes, 350);
        assert_eq!(usage.file_count, 2);
    }

    #[tokio::test]
    async fn test_clear_all_resets_usage() {
        let store = DocumentStore::in_memory();

        store.save(sample_pdf("a.pdf", 100)).await.expect("Failed to save");
        store.save(sample_pdf("b.pdf", 200)).await.expect("Failed to save");

        store.clear_all().await.expect("Failed to clear");

        assert!(store.get_all().await.expect("Failed to list").is_empty());
        let usage = store.storage_usage().await.expect("Failed to get usage");
        assert_eq!(usage.total_bytes, 0);
        assert_eq!(usage.file_count, 0);
    }

    #[tokio::test]
    async fn test_database_opens_lazily() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("library.db");

        let store = DocumentStore::new(&path);
        assert!(!path.exists(), "construction should not touch the filesystem");

        store.save(sample_pdf("first.pdf", 4)).await.expect("Failed to save");
        assert!(path.exists(), "first operation should create the database");
    }
}

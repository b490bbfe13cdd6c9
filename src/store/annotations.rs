// Folio - Offline Document Reader
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Annotation storage operations
//!
//! Functions for saving and retrieving per-document annotations from SQLite.
//! Annotation bodies are stored as JSON for flexibility; the store never
//! interprets them. Rows ride along with their document: deleting the
//! document cascades to its annotations.

use crate::error::{FolioError, Result};
use crate::store::models::Annotation;
use chrono::Utc;
use sqlx::SqlitePool;

/// Save or replace the annotations for a document
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `doc_id` - Owning document id
/// * `body` - Complete annotation state as JSON (highlights, notes, etc.)
///
/// Fails with a not-found error when no such document exists; annotations
/// cannot outlive or precede their document.
pub async fn save_annotations(
    pool: &SqlitePool,
    doc_id: &str,
    body: &serde_json::Value,
) -> Result<()> {
    let body_text = serde_json::to_string(body)?;

    let result = sqlx::query(
        r#"
        INSERT INTO Annotations (doc_id, body, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(doc_id) DO UPDATE SET
            body = excluded.body,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(doc_id)
    .bind(&body_text)
    .bind(Utc::now())
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.message().contains("FOREIGN KEY") => {
            Err(FolioError::not_found(doc_id))
        }
        Err(e) => Err(e.into()),
    }
}

/// Get the annotations for a document
///
/// Returns `None` when the document has no annotations yet (or does not
/// exist; a missing document and an unannotated one look the same here).
pub async fn get_annotations(pool: &SqlitePool, doc_id: &str) -> Result<Option<serde_json::Value>> {
    let row = sqlx::query_as::<_, Annotation>("SELECT * FROM Annotations WHERE doc_id = ?")
        .bind(doc_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(annotation) => Ok(Some(annotation.body_json()?)),
        None => Ok(None),
    }
}

/// Remove the annotations for a document, keeping the document itself
///
/// Idempotent; removing annotations that do not exist succeeds.
pub async fn delete_annotations(pool: &SqlitePool, doc_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM Annotations WHERE doc_id = ?")
        .bind(doc_id)
        .execute(pool)
        .await?;

    Ok(())
}

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


//! Deferred persistence of reading position
//!
//! Page turns happen far more often than progress is worth writing
//! synchronously. [`ProgressTracker`] converts each page change into a
//! percentage and hands the write to the deferred tier of the task queue,
//! keyed by document id so updates for one document land in the order they
//! were recorded. Navigation never waits on the database and never sees a
//! persistence failure; those are logged and dropped.

use std::sync::Arc;

use crate::store::DocumentStore;
use crate::tasks::{TaskPriority, TaskQueue};

/// Records page navigation and persists it best-effort
///
/// Cloning is cheap; clones share the store handle and the queue.
#[derive(Clone)]
pub struct ProgressTracker {
    store: Arc<DocumentStore>,
    queue: TaskQueue,
}

impl ProgressTracker {
    pub fn new(store: Arc<DocumentStore>, queue: TaskQueue) -> Self {
        Self { store, queue }
    }

    /// Record that the reader is now on `page` of a `page_count`-page document
    ///
    /// Returns as soon as the write is queued. A missing or empty `doc_id`
    /// (a document opened outside the library) and a zero `page_count` are
    /// silently skipped. The stored percentage is clamped to `0.0..=100.0`
    /// even when `page` runs past the end of the document.
    pub async fn record_page_change(&self, doc_id: Option<&str>, page: u32, page_count: u32) {
        let doc_id = match doc_id {
            Some(doc_id) if !doc_id.is_empty() => doc_id,
            _ => {
                log::trace!("Skipping progress update for untracked document");
                return;
            }
        };
        if page_count == 0 {
            log::trace!("Skipping progress update for {}: no page count yet", doc_id);
            return;
        }

        let percent = ((page as f64 / page_count as f64) * 100.0).clamp(0.0, 100.0);
        let store = Arc::clone(&self.store);
        let owned_id = doc_id.to_string();

        self.queue
            .spawn(TaskPriority::Deferred, Some(doc_id), async move {
                match store.update_progress(&owned_id, percent, page as i64).await {
                    Ok(()) => {}
                    Err(err) if err.is_not_found() => {
                        log::debug!("Dropping progress for {}: document no longer exists", owned_id);
                    }
                    Err(err) => {
                        log::warn!("Failed to persist progress for {}: {}", owned_id, err);
                    }
                }
            })
            .await;
    }

    /// Wait for every queued progress write to land
    ///
    /// Navigation never needs this; it exists for teardown and tests.
    pub async fn flush(&self) {
        self.queue.drain().await;
    }
}

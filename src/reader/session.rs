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


//! Navigation state for one open document
//!
//! A [`ReadingSession`] owns the current page, enforces page bounds, and
//! feeds every page change to the progress tracker and the pace tracker.
//! The session is purely in-memory; persistence rides on the deferred queue
//! behind [`ProgressTracker`].

use std::time::Duration;

use crate::error::{FolioError, Result};
use crate::reader::progress::ProgressTracker;
use crate::reader::stats::PaceTracker;
use crate::store::models::DocumentRecord;

/// One document open for reading
pub struct ReadingSession {
    doc_id: String,
    name: String,
    page_count: u32,
    current_page: u32,
    furthest_page: u32,
    tracker: ProgressTracker,
    pace: PaceTracker,
}

impl ReadingSession {
    /// Open a session, resuming at the last read page
    ///
    /// `page_count` comes from the rendering engine once it has parsed the
    /// document; it is not stored. A remembered position outside
    /// `1..=page_count` is clamped rather than rejected.
    pub fn begin(
        record: &DocumentRecord,
        page_count: u32,
        tracker: ProgressTracker,
    ) -> Result<Self> {
        if page_count == 0 {
            return Err(FolioError::invalid_input("document has no pages"));
        }

        let current_page = record.last_read_page.clamp(1, page_count as i64) as u32;
        log::debug!(
            "Resuming {} at page {}/{}",
            record.doc_id,
            current_page,
            page_count
        );

        let mut pace = PaceTracker::new();
        pace.add_position(current_page);

        Ok(Self {
            doc_id: record.doc_id.clone(),
            name: record.name.clone(),
            page_count,
            current_page,
            furthest_page: current_page,
            tracker,
            pace,
        })
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Highest page reached, counting the resumed position
    pub fn furthest_page(&self) -> u32 {
        self.furthest_page
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// How far through the document the current page is, 0.0 to 100.0
    pub fn progress_percent(&self) -> f64 {
        (self.current_page as f64 / self.page_count as f64) * 100.0
    }

    pub fn pages_remaining(&self) -> u32 {
        self.page_count - self.current_page
    }

    /// Advance one page; at the last page this is a no-op
    pub async fn next_page(&mut self) -> Result<u32> {
        if self.current_page >= self.page_count {
            return Ok(self.current_page);
        }
        self.move_to(self.current_page + 1).await
    }

    /// Go back one page; at the first page this is a no-op
    pub async fn prev_page(&mut self) -> Result<u32> {
        if self.current_page <= 1 {
            return Ok(self.current_page);
        }
        self.move_to(self.current_page - 1).await
    }

    /// Jump to an explicit page
    ///
    /// Unlike stepping, an out-of-range target is an error: the caller asked
    /// for a page that does not exist.
    pub async fn go_to(&mut self, page: u32) -> Result<u32> {
        if page < 1 || page > self.page_count {
            return Err(FolioError::PageOutOfRange {
                page,
                page_count: self.page_count,
            });
        }
        self.move_to(page).await
    }

    /// Snapshot of where the session stands
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            name: self.name.clone(),
            current_page: self.current_page,
            furthest_page: self.furthest_page,
            page_count: self.page_count,
            percent: self.progress_percent(),
            pages_per_minute: self.pace.pages_per_minute(),
            pages_viewed: self.pace.pages_viewed(),
            elapsed: self.pace.elapsed(),
            time_remaining: self.pace.estimate_time_remaining(self.pages_remaining()),
        }
    }

    /// Close the session, waiting for queued progress writes to land
    pub async fn finish(self) {
        self.tracker.flush().await;
    }

    // ===== Internal Methods =====

    async fn move_to(&mut self, page: u32) -> Result<u32> {
        self.current_page = page;
        self.furthest_page = self.furthest_page.max(page);
        self.pace.add_position(page);
        self.tracker
            .record_page_change(Some(&self.doc_id), page, self.page_count)
            .await;
        Ok(page)
    }
}

// Hand-written because the tracker holds boxed futures with no Debug impl
impl std::fmt::Debug for ReadingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadingSession")
            .field("doc_id", &self.doc_id)
            .field("name", &self.name)
            .field("page_count", &self.page_count)
            .field("current_page", &self.current_page)
            .field("furthest_page", &self.furthest_page)
            .finish_non_exhaustive()
    }
}

/// Point-in-time view of a reading session
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub name: String,
    pub current_page: u32,
    /// Highest page reached, counting the resumed position
    pub furthest_page: u32,
    pub page_count: u32,
    /// 0.0 - 100.0
    pub percent: f64,
    pub pages_per_minute: f64,
    pub pages_viewed: u64,
    pub elapsed: Duration,
    /// None until there is enough pace data to estimate
    pub time_remaining: Option<Duration>,
}

impl SessionStats {
    /// Format the estimated time to finish (e.g., "5m 30s")
    pub fn eta_string(&self) -> String {
        let Some(remaining) = self.time_remaining else {
            return "estimating...".to_string();
        };
        let total_seconds = remaining.as_secs();

        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m", hours, minutes)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Format the position for display
    pub fn display_string(&self) -> String {
        format!(
            "{}: page {}/{} ({:.0}%)",
            self.name, self.current_page, self.page_count, self.percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::SourceFile;
    use crate::store::DocumentStore;
    use crate::tasks::TaskQueue;
    use std::sync::Arc;

    async fn fixture() -> (Arc<DocumentStore>, ProgressTracker, String) {
        let store = Arc::new(DocumentStore::in_memory());
        let tracker = ProgressTracker::new(Arc::clone(&store), TaskQueue::new(2));
        let file = SourceFile::new("novel.pdf", "application/pdf", 1_700_000_000_000, vec![9; 64]);
        let doc_id = store.save(file).await.unwrap();
        (store, tracker, doc_id)
    }

    async fn record_of(store: &DocumentStore, doc_id: &str) -> DocumentRecord {
        store.get_by_id(doc_id).await.unwrap().record
    }

    #[tokio::test]
    async fn test_fresh_document_starts_at_page_one() {
        let (store, tracker, doc_id) = fixture().await;
        let record = record_of(&store, &doc_id).await;

        let session = ReadingSession::begin(&record, 10, tracker).unwrap();
        assert_eq!(session.current_page(), 1);
        assert_eq!(session.page_count(), 10);
        assert_eq!(session.pages_remaining(), 9);
    }

    #[tokio::test]
    async fn test_begin_resumes_last_read_page() {
        let (store, tracker, doc_id) = fixture().await;
        store.update_progress(&doc_id, 50.0, 5).await.unwrap();
        let record = record_of(&store, &doc_id).await;

        let session = ReadingSession::begin(&record, 10, tracker).unwrap();
        assert_eq!(session.current_page(), 5);
    }

    #[tokio::test]
    async fn test_begin_clamps_out_of_range_resume() {
        let (store, tracker, doc_id) = fixture().await;
        store.update_progress(&doc_id, 100.0, 99).await.unwrap();
        let record = record_of(&store, &doc_id).await;

        let session = ReadingSession::begin(&record, 10, tracker).unwrap();
        assert_eq!(session.current_page(), 10);
    }

    #[tokio::test]
    async fn test_begin_rejects_zero_page_document() {
        let (store, tracker, doc_id) = fixture().await;
        let record = record_of(&store, &doc_id).await;

        let err = ReadingSession::begin(&record, 0, tracker).unwrap_err();
        assert!(matches!(err, FolioError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_navigation_persists_on_finish() {
        let (store, tracker, doc_id) = fixture().await;
        let record = record_of(&store, &doc_id).await;

        let mut session = ReadingSession::begin(&record, 4, tracker).unwrap();
        session.next_page().await.unwrap();
        session.next_page().await.unwrap();
        assert_eq!(session.current_page(), 3);
        session.finish().await;

        let record = record_of(&store, &doc_id).await;
        assert_eq!(record.last_read_page, 3);
        assert_eq!(record.reading_progress, 75.0);
    }

    #[tokio::test]
    async fn test_next_at_last_page_is_noop() {
        let (store, tracker, doc_id) = fixture().await;
        let record = record_of(&store, &doc_id).await;

        let mut session = ReadingSession::begin(&record, 2, tracker).unwrap();
        assert_eq!(session.next_page().await.unwrap(), 2);
        assert_eq!(session.next_page().await.unwrap(), 2);
        session.finish().await;

        let record = record_of(&store, &doc_id).await;
        assert_eq!(record.last_read_page, 2);
        assert_eq!(record.reading_progress, 100.0);
    }

    #[tokio::test]
    async fn test_prev_at_first_page_is_noop() {
        let (store, tracker, doc_id) = fixture().await;
        let record = record_of(&store, &doc_id).await;

        let mut session = ReadingSession::begin(&record, 5, tracker).unwrap();
        assert_eq!(session.prev_page().await.unwrap(), 1);

        session.finish().await;
        let record = record_of(&store, &doc_id).await;
        assert_eq!(record.reading_progress, 0.0);
    }

    #[tokio::test]
    async fn test_go_to_validates_bounds() {
        let (store, tracker, doc_id) = fixture().await;
        let record = record_of(&store, &doc_id).await;

        let mut session = ReadingSession::begin(&record, 10, tracker).unwrap();
        assert!(matches!(
            session.go_to(0).await.unwrap_err(),
            FolioError::PageOutOfRange { .. }
        ));
        assert!(matches!(
            session.go_to(11).await.unwrap_err(),
            FolioError::PageOutOfRange { .. }
        ));
        assert_eq!(session.current_page(), 1);

        assert_eq!(session.go_to(7).await.unwrap(), 7);
        assert_eq!(session.progress_percent(), 70.0);
    }

    #[tokio::test]
    async fn test_stats_snapshot() {
        let (store, tracker, doc_id) = fixture().await;
        let record = record_of(&store, &doc_id).await;

        let mut session = ReadingSession::begin(&record, 8, tracker).unwrap();
        session.go_to(2).await.unwrap();

        let stats = session.stats();
        assert_eq!(stats.current_page, 2);
        assert_eq!(stats.furthest_page, 2);
        assert_eq!(stats.page_count, 8);
        assert_eq!(stats.percent, 25.0);
        assert_eq!(stats.pages_viewed, 2);
        assert!(stats.display_string().contains("page 2/8"));
        session.finish().await;
    }

    #[tokio::test]
    async fn test_furthest_page_survives_backtracking() {
        let (store, tracker, doc_id) = fixture().await;
        let record = record_of(&store, &doc_id).await;

        let mut session = ReadingSession::begin(&record, 10, tracker).unwrap();
        session.go_to(6).await.unwrap();
        session.prev_page().await.unwrap();
        session.prev_page().await.unwrap();

        assert_eq!(session.current_page(), 4);
        assert_eq!(session.furthest_page(), 6);
        session.finish().await;
    }

    #[test]
    fn test_eta_string_formats() {
        let mut stats = SessionStats {
            name: "novel.pdf".to_string(),
            current_page: 1,
            furthest_page: 1,
            page_count: 10,
            percent: 10.0,
            pages_per_minute: 0.0,
            pages_viewed: 1,
            elapsed: Duration::from_secs(0),
            time_remaining: None,
        };
        assert_eq!(stats.eta_string(), "estimating...");

        stats.time_remaining = Some(Duration::from_secs(45));
        assert_eq!(stats.eta_string(), "45s");

        stats.time_remaining = Some(Duration::from_secs(330));
        assert_eq!(stats.eta_string(), "5m 30s");

        stats.time_remaining = Some(Duration::from_secs(3660));
        assert_eq!(stats.eta_string(), "1h 1m");
    }
}

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


//! The library view: what the user browses before opening a document
//!
//! Listings are derived from store metadata only; payloads never leave the
//! database for a listing. Sorting and filtering happen in memory, which is
//! cheap at library scale and keeps the store's query surface small.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::models::{DocumentRecord, StorageUsage};
use crate::store::DocumentStore;

/// Sort order for library listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentOrder {
    /// Alphabetical by name, case-insensitive
    Name,
    /// Newest upload first
    Newest,
    /// Largest payload first
    Largest,
    /// Most recently read first; never-opened documents sink to the end
    RecentlyRead,
}

/// Options for a library listing
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub order: DocumentOrder,

    /// Case-insensitive substring match on the document name
    pub name_filter: Option<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            order: DocumentOrder::Newest,
            name_filter: None,
        }
    }
}

/// Read-only catalog over the document store
pub struct Library {
    store: Arc<DocumentStore>,
}

impl Library {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// List every document's metadata, filtered and sorted
    pub async fn list(&self, options: &ListOptions) -> Result<Vec<DocumentRecord>> {
        let mut records = self.store.get_all().await?;

        if let Some(filter) = &options.name_filter {
            let needle = filter.to_lowercase();
            records.retain(|record| record.name.to_lowercase().contains(&needle));
        }

        match options.order {
            DocumentOrder::Name => {
                records.sort_by_key(|record| record.name.to_lowercase());
            }
            DocumentOrder::Newest => {
                records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
            }
            DocumentOrder::Largest => {
                records.sort_by(|a, b| b.size.cmp(&a.size));
            }
            DocumentOrder::RecentlyRead => {
                // None sorts below every Some, so unread documents land last
                records.sort_by(|a, b| b.last_read_at.cmp(&a.last_read_at));
            }
        }

        Ok(records)
    }

    /// How much the library occupies: stored bytes and document count
    pub async fn usage(&self) -> Result<StorageUsage> {
        self.store.storage_usage().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::SourceFile;
    use std::time::Duration;

    async fn seeded_library() -> (Arc<DocumentStore>, Library, Vec<String>) {
        let store = Arc::new(DocumentStore::in_memory());
        let library = Library::new(Arc::clone(&store));

        let mut ids = Vec::new();
        for (name, size) in [("beta.pdf", 300), ("alpha.pdf", 100), ("Gamma.pdf", 200)] {
            let file = SourceFile::new(name, "application/pdf", 1_700_000_000_000, vec![0u8; size]);
            ids.push(store.save(file).await.unwrap());
            // Keep upload timestamps strictly increasing
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        (store, library, ids)
    }

    #[tokio::test]
    async fn test_empty_library_lists_nothing() {
        let store = Arc::new(DocumentStore::in_memory());
        let library = Library::new(store);

        let records = library.list(&ListOptions::default()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_sort_by_name_is_case_insensitive() {
        let (_store, library, _ids) = seeded_library().await;

        let options = ListOptions {
            order: DocumentOrder::Name,
            name_filter: None,
        };
        let names: Vec<String> = library
            .list(&options)
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.name)
            .collect();

        assert_eq!(names, vec!["alpha.pdf", "beta.pdf", "Gamma.pdf"]);
    }

    #[tokio::test]
    async fn test_sort_newest_first() {
        let (_store, library, _ids) = seeded_library().await;

        let names: Vec<String> = library
            .list(&ListOptions::default())
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.name)
            .collect();

        assert_eq!(names, vec!["Gamma.pdf", "alpha.pdf", "beta.pdf"]);
    }

    #[tokio::test]
    async fn test_sort_largest_first() {
        let (_store, library, _ids) = seeded_library().await;

        let options = ListOptions {
            order: DocumentOrder::Largest,
            name_filter: None,
        };
        let sizes: Vec<i64> = library
            .list(&options)
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.size)
            .collect();

        assert_eq!(sizes, vec![300, 200, 100]);
    }

    #[tokio::test]
    async fn test_recently_read_sinks_unopened_documents() {
        let (store, library, ids) = seeded_library().await;

        // beta read first, then Gamma; alpha stays unopened
        store.update_progress(&ids[0], 10.0, 2).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.update_progress(&ids[2], 20.0, 3).await.unwrap();

        let options = ListOptions {
            order: DocumentOrder::RecentlyRead,
            name_filter: None,
        };
        let names: Vec<String> = library
            .list(&options)
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.name)
            .collect();

        assert_eq!(names, vec!["Gamma.pdf", "beta.pdf", "alpha.pdf"]);
    }

    #[tokio::test]
    async fn test_name_filter_matches_substring_case_insensitively() {
        let (_store, library, _ids) = seeded_library().await;

        let options = ListOptions {
            order: DocumentOrder::Name,
            name_filter: Some("GAM".to_string()),
        };
        let records = library.list(&options).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Gamma.pdf");
    }

    #[tokio::test]
    async fn test_usage_reflects_stored_documents() {
        let (_store, library, _ids) = seeded_library().await;

        let usage = library.usage().await.unwrap();
        assert_eq!(usage.total_bytes, 600);
        assert_eq!(usage.file_count, 3);
    }
}

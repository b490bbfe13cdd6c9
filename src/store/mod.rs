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


//! Document storage and models
//!
//! This module handles all persistence for the document library using SQLite.
//! A single table carries both the payload and the reading metadata, so a
//! stored document can never exist without its content.
//!
//! # Database Schema
//! - Documents: payload plus metadata (name, size, mime type, upload time,
//!   reading progress, last read page)
//! - Annotations: opaque per-document JSON, cascade-deleted with the document
//! - _migrations: applied schema versions
//!
//! # Usage Example
//! ```no_run
//! use folio_core::store::{DocumentStore, models::SourceFile};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // The composition root constructs one store and shares it by reference
//! let store = DocumentStore::new("./library.db");
//!
//! // Save a document; the database opens on this first operation
//! let file = SourceFile::new("thesis.pdf", "application/pdf", 0, vec![0x25, 0x50]);
//! let id = store.save(file).await?;
//!
//! // Listings never carry payload bytes
//! for record in store.get_all().await? {
//!     println!("{}: {:.1}%", record.name, record.reading_progress);
//! }
//!
//! // Fetch the full document back by id
//! let doc = store.get_by_id(&id).await?;
//! assert_eq!(doc.file.name, "thesis.pdf");
//! # Ok(())
//! # }
//! ```

pub mod annotations;
pub mod database;
pub mod documents;
pub mod migrations;
pub mod models;

// Re-export commonly used types
pub use database::{Database, StoreConfig};
pub use documents::DocumentStore;
pub use models::{
    Annotation, DocumentFile, DocumentRecord, NewDocument, RetrievedDocument, SourceFile,
    StorageUsage, StoredDocument,
};

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


//! Core of an offline document reader: a local library of PDFs with
//! remembered reading positions.
//!
//! Documents live as blobs in a single SQLite database ([`store`]), the
//! library view derives listings and storage totals from their metadata
//! ([`library`]), and the reading flow records page positions through a
//! deferred task queue so navigation never waits on persistence ([`reader`],
//! [`tasks`]). Viewer settings sit in a versioned JSON file next to the
//! database ([`prefs`]).

pub mod error;
pub mod library;
pub mod prefs;
pub mod reader;
pub mod store;
pub mod tasks;

pub use error::{FolioError, Result};
pub use library::{DocumentOrder, Library, ListOptions};
pub use prefs::{PreferencesStore, ViewerPreferences};
pub use reader::{ProgressTracker, ReadingSession, RenderSlot, UploadPolicy};
pub use store::{Database, DocumentStore, StoreConfig};
pub use tasks::{TaskPriority, TaskQueue};

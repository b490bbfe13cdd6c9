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


//! Viewer preferences, persisted as a small versioned JSON file
//!
//! Preferences live next to the library database rather than inside it: they
//! are per-installation, tiny, and useful to inspect or delete by hand. The
//! file carries a schema version so a newer installation's settings are never
//! silently rewritten by an older build.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};
use crate::library::DocumentOrder;
use crate::store::Database;
use crate::tasks::{TaskPriority, TaskQueue};

const PREFS_SCHEMA_VERSION: u32 = 1;

/// Queue key for preference writes, so rapid saves land in issuance order
const PREFS_QUEUE_KEY: &str = "preferences";

/// Settings the viewer applies when opening documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerPreferences {
    /// Zoom applied when a document opens, in percent
    pub default_zoom_percent: u32,

    /// Invert page colors for night reading
    pub invert_colors: bool,

    /// Reopen documents at the last read page instead of page one
    pub resume_last_page: bool,

    /// Sort order the library opens with
    pub library_order: DocumentOrder,

    /// Document to reopen on launch, if any
    #[serde(default)]
    pub last_opened_doc_id: Option<String>,

    /// Last page shown per document id
    ///
    /// A hint only; the store's `last_read_page` is authoritative. This map
    /// lets the viewer restore a position even for documents opened but never
    /// saved to the library.
    #[serde(default)]
    pub page_hints: HashMap<String, u32>,
}

impl ViewerPreferences {
    /// Record that `doc_id` is open at `page`
    pub fn note_opened(&mut self, doc_id: &str, page: u32) {
        self.last_opened_doc_id = Some(doc_id.to_string());
        self.page_hints.insert(doc_id.to_string(), page);
    }

    /// Page hint for a document, if one was recorded
    pub fn page_hint(&self, doc_id: &str) -> Option<u32> {
        self.page_hints.get(doc_id).copied()
    }

    /// Drop all trace of a document (used when it is deleted)
    pub fn forget_document(&mut self, doc_id: &str) {
        self.page_hints.remove(doc_id);
        if self.last_opened_doc_id.as_deref() == Some(doc_id) {
            self.last_opened_doc_id = None;
        }
    }
}

impl Default for ViewerPreferences {
    fn default() -> Self {
        Self {
            default_zoom_percent: 100,
            invert_colors: false,
            resume_last_page: true,
            library_order: DocumentOrder::Newest,
            last_opened_doc_id: None,
            page_hints: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PreferencesEnvelope {
    version: u32,
    preferences: ViewerPreferences,
}

/// Loads and saves [`ViewerPreferences`] at a fixed path
#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Platform default: `preferences.json` next to the library database
    pub fn default_path() -> PathBuf {
        Database::default_path().with_file_name("preferences.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load preferences, falling back to defaults when the file is missing
    /// or unreadable
    ///
    /// A file written by a newer build (higher schema version) is an error;
    /// anything else wrong with the content just logs and yields defaults,
    /// so one bad byte can't lock the viewer out of its settings.
    pub async fn load(&self) -> Result<ViewerPreferences> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(ViewerPreferences::default());
            }
            Err(err) => return Err(err.into()),
        };

        let envelope: PreferencesEnvelope = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(err) => {
                log::warn!(
                    "Ignoring unreadable preferences at {}: {}",
                    self.path.display(),
                    err
                );
                return Ok(ViewerPreferences::default());
            }
        };

        if envelope.version > PREFS_SCHEMA_VERSION {
            return Err(FolioError::UnsupportedPreferencesVersion {
                found: envelope.version,
                supported: PREFS_SCHEMA_VERSION,
            });
        }

        Ok(envelope.preferences)
    }

    /// Persist preferences atomically
    ///
    /// Writes to a sibling temp file and renames it into place so a crash
    /// mid-write never leaves a torn file.
    pub async fn save(&self, preferences: &ViewerPreferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let envelope = PreferencesEnvelope {
            version: PREFS_SCHEMA_VERSION,
            preferences: preferences.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&envelope)?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Queue a save on the deferred tier and return without waiting
    ///
    /// Preference writes are best-effort, like progress writes: the caller
    /// never blocks on the disk and a failure is logged, not surfaced. All
    /// saves share one queue key, so they land in issuance order and the
    /// file always ends up holding the newest snapshot.
    pub async fn save_deferred(&self, queue: &TaskQueue, preferences: ViewerPreferences) {
        let store = self.clone();
        queue
            .spawn(TaskPriority::Deferred, Some(PREFS_QUEUE_KEY), async move {
                if let Err(err) = store.save(&preferences).await {
                    log::warn!(
                        "Dropping failed preferences write to {}: {}",
                        store.path.display(),
                        err
                    );
                }
            })
            .await;
    }
}

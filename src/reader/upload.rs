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


//! Validation of incoming documents before they reach the store

use crate::error::{FolioError, Result};
use crate::store::models::SourceFile;

/// What the library accepts at upload time
///
/// The store itself takes any blob; this policy is the gate the import
/// surface applies before calling [`DocumentStore::save`].
///
/// [`DocumentStore::save`]: crate::store::DocumentStore::save
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_bytes: u64,
    accepted_types: Vec<String>,
}

impl UploadPolicy {
    /// Default size limit: 50 MiB
    pub const DEFAULT_MAX_BYTES: u64 = 50 * 1024 * 1024;

    /// Policy accepting PDF documents up to [`Self::DEFAULT_MAX_BYTES`]
    pub fn new() -> Self {
        Self {
            max_bytes: Self::DEFAULT_MAX_BYTES,
            accepted_types: vec!["application/pdf".to_string()],
        }
    }

    /// Override the size limit in bytes
    pub fn with_limit(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Accept an additional MIME type
    pub fn accept(mut self, mime_type: &str) -> Self {
        self.accepted_types.push(mime_type.to_ascii_lowercase());
        self
    }

    /// The current size limit in bytes
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Whether a MIME type passes the policy (case-insensitive)
    pub fn is_accepted_type(&self, mime_type: &str) -> bool {
        let mime_type = mime_type.to_ascii_lowercase();
        self.accepted_types.iter().any(|accepted| *accepted == mime_type)
    }

    /// Validate a file against the policy
    pub fn check(&self, file: &SourceFile) -> Result<()> {
        if !self.is_accepted_type(&file.mime_type) {
            return Err(FolioError::UnsupportedDocumentType(file.mime_type.clone()));
        }
        if file.data.is_empty() {
            return Err(FolioError::EmptyDocument);
        }
        let size = file.data.len() as u64;
        if size > self.max_bytes {
            return Err(FolioError::DocumentTooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new()
    }
}

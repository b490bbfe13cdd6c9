//! Database models for the document library
//!
//! This module contains the entity models persisted by the record store,
//! the ingest/result value objects surrounding them, and document id
//! synthesis.
//!
//! # SQLite Adaptations
//! - Timestamps stored as TEXT in ISO 8601 format (`last_modified` is the
//!   exception: it arrives from the source file as epoch milliseconds and is
//!   stored verbatim as INTEGER)
//! - Payload stored as BLOB, excluded from every listing query
//! - Annotation bodies stored as JSON strings (opaque to the store)

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// VALUE OBJECTS
// ============================================================================

/// A file-like input handed to the store at save time
///
/// Carries the attributes the store copies into the new record verbatim.
/// `size` is whatever the source reported; the store aggregates over this
/// field for usage stats rather than measuring payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub size: i64,
    pub mime_type: String,
    /// Source file modification time, epoch milliseconds
    pub last_modified: i64,
    pub data: Vec<u8>,
}

impl SourceFile {
    /// Build a source file from raw bytes, deriving `size` from the payload
    pub fn new<S: Into<String>, M: Into<String>>(
        name: S,
        mime_type: M,
        last_modified: i64,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            size: data.len() as i64,
            mime_type: mime_type.into(),
            last_modified,
            data,
        }
    }
}

/// A file-like value reconstructed from a stored record
///
/// Rebuilt from the payload and stored attributes on every fetch; holding one
/// of these gives the caller no write path back into the store.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    pub name: String,
    pub mime_type: String,
    /// Source file modification time, epoch milliseconds
    pub last_modified: i64,
    pub data: Vec<u8>,
}

/// Aggregate storage statistics
///
/// `total_bytes` is the sum of the stored `size` fields, not the on-disk
/// footprint of the database file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageUsage {
    pub total_bytes: i64,
    pub file_count: i64,
}

impl StorageUsage {
    /// Total size in mebibytes, for display
    pub fn total_megabytes(&self) -> f64 {
        self.total_bytes as f64 / (1024.0 * 1024.0)
    }
}

// ============================================================================
// MAIN ENTITIES
// ============================================================================

/// A complete stored document row, payload included
///
/// Only fetched by id; listings use [`DocumentRecord`] so payload bytes never
/// travel with them.
#[derive(Debug, Clone, FromRow)]
pub struct StoredDocument {
    pub doc_id: String,

    // Immutable attributes copied from the source file
    pub name: String,
    pub size: i64,
    pub mime_type: String,
    pub last_modified: i64,

    // Set at creation
    pub uploaded_at: DateTime<Utc>,

    // Payload, immutable after insert
    pub data: Vec<u8>,

    // Reading metadata
    pub reading_progress: f64,
    pub last_read_page: i64,
    #[sqlx(default)]
    pub last_read_at: Option<DateTime<Utc>>,
}

impl StoredDocument {
    /// Split into a reconstructed file and the payload-free record
    pub fn into_parts(self) -> (DocumentFile, DocumentRecord) {
        let record = DocumentRecord {
            doc_id: self.doc_id,
            name: self.name.clone(),
            size: self.size,
            mime_type: self.mime_type.clone(),
            last_modified: self.last_modified,
            uploaded_at: self.uploaded_at,
            reading_progress: self.reading_progress,
            last_read_page: self.last_read_page,
            last_read_at: self.last_read_at,
        };
        let file = DocumentFile {
            name: self.name,
            mime_type: self.mime_type,
            last_modified: self.last_modified,
            data: self.data,
        };
        (file, record)
    }
}

/// Document metadata without the payload
///
/// The listing type: there is no payload field to strip because the type
/// never carries one.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub doc_id: String,
    pub name: String,
    pub size: i64,
    pub mime_type: String,
    pub last_modified: i64,
    pub uploaded_at: DateTime<Utc>,
    pub reading_progress: f64,
    pub last_read_page: i64,
    #[sqlx(default)]
    pub last_read_at: Option<DateTime<Utc>>,
}

impl DocumentRecord {
    /// Whether any progress update has ever landed for this document
    pub fn has_been_read(&self) -> bool {
        self.last_read_at.is_some()
    }

    /// Size in mebibytes, for display
    pub fn size_megabytes(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0)
    }
}

/// A fetched document: reconstructed file plus its metadata record
#[derive(Debug, Clone)]
pub struct RetrievedDocument {
    pub file: DocumentFile,
    pub record: DocumentRecord,
}

/// Per-document annotation row
///
/// `body` is opaque JSON owned by the reading UI; the store just keeps it
/// next to the document and drops it on delete.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Annotation {
    pub doc_id: String,
    pub body: String,
    pub updated_at: DateTime<Utc>,
}

impl Annotation {
    /// Parse the stored body back into JSON
    pub fn body_json(&self) -> crate::error::Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

// ============================================================================
// NEW RECORD STRUCTS (for inserts)
// ============================================================================

/// New document record for insertion
///
/// Synthesizes the document id and creation timestamp; reading metadata
/// starts at progress 0, page 1.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub doc_id: String,
    pub name: String,
    pub size: i64,
    pub mime_type: String,
    pub last_modified: i64,
    pub uploaded_at: DateTime<Utc>,
    pub data: Vec<u8>,
}

impl NewDocument {
    pub fn from_source(source: SourceFile) -> Self {
        Self {
            doc_id: generate_doc_id(),
            name: source.name,
            size: source.size,
            mime_type: source.mime_type,
            last_modified: source.last_modified,
            uploaded_at: Utc::now(),
            data: source.data,
        }
    }
}

/// Synthesize a new document id: epoch millis, underscore, nine random
/// base-36 characters
///
/// The timestamp half keeps ids roughly sortable by creation; the random
/// half keeps saves in the same millisecond distinct.
fn generate_doc_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let millis = Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}_{}", millis, suffix)
}

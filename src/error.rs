//! Error types for Folio
//!
//! This module defines error types using thiserror for ergonomic error handling.
//! Errors are categorized by domain (storage, records, validation, reader) for
//! better error handling and reporting.
//!
//! The taxonomy deliberately separates three caller-visible classes:
//! - storage-engine failures (surfaced, never retried by the store itself),
//! - missing-record lookups (surfaced as not-found),
//! - input validation failures (rejected before the store is touched).

use thiserror::Error;

/// Result type alias using our FolioError type
pub type Result<T> = std::result::Result<T, FolioError>;

/// Main error type for Folio
///
/// This enum provides comprehensive error handling for all operations in the
/// library. Each variant includes descriptive error messages and relevant
/// context.
#[derive(Error, Debug)]
pub enum FolioError {
    // ===== Storage Errors =====
    // Engine-level failures: open, read, write, delete. Never retried here;
    // callers decide whether to retry, surface, or drop.

    /// Storage engine could not be opened or is unavailable
    #[error("Storage unavailable: {message}")]
    StorageUnavailable {
        message: String,
        /// Database path if one was resolved before the failure
        path: Option<String>,
    },

    /// A read/write/delete against an open storage engine failed
    #[error("Storage operation failed: {0}")]
    StorageFailed(String),

    /// Database schema migration failed during open
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    // ===== Record Errors =====

    /// No record matches the requested document id
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    // ===== Validation Errors =====
    // Raised at the ingest edge, before any storage write is attempted.

    /// Document type is not accepted by the upload policy
    #[error("Unsupported document type: {0}")]
    UnsupportedDocumentType(String),

    /// Document exceeds the configured size limit
    #[error("Document too large: {size} bytes (limit {limit} bytes)")]
    DocumentTooLarge { size: u64, limit: u64 },

    /// No document bytes were provided
    #[error("No document provided")]
    EmptyDocument,

    /// Generic input validation error
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ===== Reader Errors =====

    /// Requested page lies outside the open document
    #[error("Page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: u32 },

    /// The rendering collaborator reported a failure
    #[error("Render failed: {0}")]
    RenderFailed(String),

    // ===== Preferences/Configuration Errors =====

    /// Preferences file carries a schema version newer than this build knows
    #[error("Unsupported preferences version: {found} (supported up to {supported})")]
    UnsupportedPreferencesVersion { found: u32, supported: u32 },

    /// Configuration is invalid or incomplete
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    // ===== General Errors =====

    /// Operation was cancelled cooperatively
    #[error("Operation cancelled")]
    Cancelled,

    // ===== External Library Errors =====
    // Automatic conversions from external error types

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// Database driver error from sqlx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// Helper methods for creating common errors
impl FolioError {
    /// Create a DocumentNotFound error with the missing id
    pub fn not_found<S: Into<String>>(id: S) -> Self {
        FolioError::DocumentNotFound(id.into())
    }

    /// Create an InvalidInput error with a message
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        FolioError::InvalidInput(message.into())
    }

    /// Create a StorageUnavailable error for a failed open
    pub fn storage_unavailable<S: Into<String>>(message: S, path: Option<String>) -> Self {
        FolioError::StorageUnavailable {
            message: message.into(),
            path,
        }
    }

    /// Create a StorageFailed error with a message
    pub fn storage_failed<S: Into<String>>(message: S) -> Self {
        FolioError::StorageFailed(message.into())
    }

    /// Create a MigrationFailed error with a message
    pub fn migration_failed<S: Into<String>>(message: S) -> Self {
        FolioError::MigrationFailed(message.into())
    }

    /// Check if error means "no such record"
    ///
    /// Callers use this to distinguish a missing document (often recoverable,
    /// e.g. a stale id in a saved preference) from an engine failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FolioError::DocumentNotFound(_))
    }

    /// Check if error came from the storage engine itself
    ///
    /// Returns `true` for open/read/write/delete failures and migration
    /// failures, including driver errors converted via `#[from]`.
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            FolioError::StorageUnavailable { .. }
                | FolioError::StorageFailed(_)
                | FolioError::MigrationFailed(_)
                | FolioError::SqlxError(_)
        )
    }

    /// Check if error is an ingest validation rejection
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            FolioError::UnsupportedDocumentType(_)
                | FolioError::DocumentTooLarge { .. }
                | FolioError::EmptyDocument
                | FolioError::InvalidInput(_)
        )
    }

    /// Check if error is a cooperative cancellation
    ///
    /// Cancellation is a benign outcome for render work; callers swallow it
    /// rather than surfacing it to users.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FolioError::Cancelled)
    }

    /// Get user-friendly error message suitable for display
    ///
    /// This returns actionable error messages that can be shown to end users,
    /// with technical details omitted where appropriate.
    pub fn user_message(&self) -> String {
        match self {
            FolioError::StorageUnavailable { path, .. } => {
                if let Some(p) = path {
                    format!("The document library at '{}' could not be opened. Check that the location exists and is writable.", p)
                } else {
                    "The document library could not be opened. Check that the storage location exists and is writable.".to_string()
                }
            }
            FolioError::DocumentNotFound(id) => {
                format!("Document '{}' is no longer in the library.", id)
            }
            FolioError::UnsupportedDocumentType(mime) => {
                format!("'{}' is not a supported document type. Please select a PDF file.", mime)
            }
            FolioError::DocumentTooLarge { size, limit } => {
                format!(
                    "Document is too large: {} MB (limit {} MB).",
                    size / 1_048_576,
                    limit / 1_048_576
                )
            }
            FolioError::EmptyDocument => "No document was selected.".to_string(),
            FolioError::UnsupportedPreferencesVersion { found, supported } => {
                format!(
                    "Settings were written by a newer version (v{}, this build reads up to v{}).",
                    found, supported
                )
            }
            _ => self.to_string(),
        }
    }
}

// ===== IMPLEMENTATION NOTES =====
//
// ## Error Handling Strategy
//
// 1. **Use thiserror for ergonomic error definitions**
//    - Each variant has a clear, descriptive `#[error]` message
//    - Structured errors include context fields (sizes, paths, versions)
//    - Automatic conversions via `#[from]` for external errors
//
// 2. **Return Result<T> = std::result::Result<T, FolioError> from all fallible functions**
//    - Consistent error type across the codebase
//    - Use the `Result<T>` type alias from this module
//
// 3. **Propagation policy**
//    - The store never swallows an engine error; every failed operation
//      returns a descriptive error to the caller.
//    - Deferred best-effort writes (progress persistence, preference writes)
//      are the one place failures are logged and dropped, because they are
//      not user-facing critical paths.
//    - No automatic retry exists anywhere in the library; retry is a caller
//      concern.
//
// 4. **Provide user-friendly messages via user_message()**
//    - Technical errors → actionable user messages
//    - Storage paths included only when already known to the caller
//
// ## Error Categorization Methods
//
// - `is_not_found()` - Missing record, distinct from engine health
// - `is_storage_error()` - Engine open/read/write/delete or migration failure
// - `is_validation_error()` - Ingest rejection, never reached the store
// - `is_cancelled()` - Cooperative cancellation, benign for render work
//
// ## Usage Examples
//
// ```rust
// // Simple string errors
// return Err(FolioError::DocumentNotFound("1700000000000_a1b2c3d4e".to_string()));
//
// // Structured errors with context
// return Err(FolioError::DocumentTooLarge { size: 61_000_000, limit: 52_428_800 });
//
// // Automatic conversion from external errors
// let row = sqlx::query("SELECT 1").fetch_one(pool).await?; // sqlx::Error → FolioError::SqlxError
// ```

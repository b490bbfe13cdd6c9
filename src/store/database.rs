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


//! Database connection and management
//!
//! This module handles database connection pooling, initialization, and
//! maintenance for the document library.
//!
//! # Database Location
//! - macOS: ~/Library/Application Support/Folio/library.db
//! - Linux: ~/.local/share/Folio/library.db
//! - Windows: %APPDATA%/Folio/library.db
//!
//! # SQLite Configuration
//! - WAL mode for better concurrency
//! - Foreign keys enabled (annotations are cascade-deleted with documents)
//! - Incremental auto-vacuum so deleted payloads return space over time
//! - Normal synchronous mode (balance safety/speed)

use crate::error::{FolioError, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    ConnectOptions,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Store configuration
///
/// Owned by the composition root; the CLI maps its flags onto this before
/// constructing a store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the SQLite database file (created if missing)
    pub database_path: PathBuf,

    /// Maximum connections in the pool
    pub max_connections: u32,

    /// How long a connection waits on a locked database before failing
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: Database::default_path(),
            max_connections: 5,
            busy_timeout: Duration::from_secs(30),
        }
    }
}

/// Database handle - owns the connection pool shared by all store operations
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    path: Option<PathBuf>, // None for in-memory databases
}

impl Database {
    /// Open (or create) the library database and bring its schema up to date
    ///
    /// Shorthand for [`Database::open_with`] using the default pool settings.
    pub async fn open<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let config = StoreConfig {
            database_path: database_path.as_ref().to_path_buf(),
            ..StoreConfig::default()
        };
        Self::open_with(&config).await
    }

    /// Open (or create) the library database with explicit configuration
    ///
    /// # Errors
    /// Returns error if:
    /// - Parent directory doesn't exist and can't be created
    /// - Database file can't be opened
    /// - Migrations fail
    /// - Pragma configuration fails
    pub async fn open_with(config: &StoreConfig) -> Result<Self> {
        if config.max_connections == 0 {
            return Err(FolioError::InvalidConfiguration(
                "max_connections must be at least 1".to_string(),
            ));
        }
        let path = config.database_path.as_path();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    FolioError::storage_unavailable(
                        format!(
                            "Failed to create database directory {}: {}",
                            parent.display(),
                            e
                        ),
                        Some(path.display().to_string()),
                    )
                })?;
            }
        }

        log::debug!("opening document database at {}", path.display());

        // Create connection options
        let connection_string = format!("sqlite://{}?mode=rwc", path.display());
        let mut connect_opts = SqliteConnectOptions::from_str(&connection_string)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .foreign_keys(true)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(config.busy_timeout);

        // Disable logging for production use
        connect_opts = connect_opts.disable_statement_logging();

        // Create connection pool
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.busy_timeout)
            .connect_with(connect_opts)
            .await
            .map_err(|e| {
                FolioError::storage_unavailable(
                    e.to_string(),
                    Some(path.display().to_string()),
                )
            })?;

        // Configure database with pragmas
        Self::configure_database(&pool).await?;

        // Run migrations
        let db = Self {
            pool,
            path: Some(path.to_path_buf()),
        };
        db.migrate().await?;

        Ok(db)
    }

    /// Create in-memory database for testing
    ///
    /// # Errors
    /// Returns error if database creation or migration fails
    pub async fn in_memory() -> Result<Self> {
        let connect_opts = SqliteConnectOptions::from_str("sqlite::memory:")?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .foreign_keys(true)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(1) // In-memory DB typically single-threaded
            .connect_with(connect_opts)
            .await?;

        Self::configure_database(&pool).await?;

        let db = Self { pool, path: None };
        db.migrate().await?;

        Ok(db)
    }

    /// Configure database with pragmas
    ///
    /// Sets up SQLite pragmas for optimal performance and reliability:
    /// - WAL journal mode (already set in connect options)
    /// - Foreign keys enabled (already set in connect options)
    /// - Incremental auto-vacuum
    async fn configure_database(pool: &SqlitePool) -> Result<()> {
        // Enable incremental auto-vacuum
        sqlx::query("PRAGMA auto_vacuum = INCREMENTAL")
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Run database migrations
    ///
    /// Applies all pending migrations to bring the database schema up to date.
    /// Migrations are run automatically when opening a database.
    pub async fn migrate(&self) -> Result<()> {
        // Run migrations defined in migrations.rs
        crate::store::migrations::run_migrations(&self.pool)
            .await
            .map_err(|e| FolioError::MigrationFailed(e.to_string()))?;

        Ok(())
    }

    /// Get reference to the connection pool
    ///
    /// Use this to execute queries directly on the pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get database file path
    ///
    /// Returns `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Close database and release all connections
    ///
    /// This will wait for all active connections to finish before closing.
    pub async fn close(self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }

    /// Get default database path for the platform
    ///
    /// Returns platform-specific application data directory path:
    /// - macOS: ~/Library/Application Support/Folio/library.db
    /// - Linux: ~/.local/share/Folio/library.db
    /// - Windows: %APPDATA%/Folio/library.db
    pub fn default_path() -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("Folio")
                .join("library.db")
        }

        #[cfg(target_os = "linux")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("Folio")
                .join("library.db")
        }

        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("Folio").join("library.db")
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            PathBuf::from("./library.db")
        }
    }

    /// Get database size in bytes
    ///
    /// Returns size of the main database file on disk. This is distinct from
    /// the logical storage usage reported by the store, which sums stored
    /// document sizes. For in-memory databases, returns 0.
    pub async fn file_size(&self) -> Result<u64> {
        if let Some(path) = &self.path {
            let metadata = std::fs::metadata(path).map_err(|e| {
                FolioError::storage_failed(format!(
                    "Failed to get database size for {}: {}",
                    path.display(),
                    e
                ))
            })?;
            Ok(metadata.len())
        } else {
            // In-memory database
            Ok(0)
        }
    }

    /// Vacuum database to reclaim unused space
    ///
    /// Deleted document payloads leave free pages behind; this rewrites the
    /// file to drop them. The operation may take some time for large
    /// libraries.
    pub async fn vacuum(&self) -> Result<()> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }

    /// Check database integrity
    ///
    /// Runs SQLite integrity check and returns true if database is okay.
    /// This is a thorough check that scans the entire database.
    pub async fn check_integrity(&self) -> Result<bool> {
        let result: String = sqlx::query_scalar("PRAGMA integrity_check")
            .fetch_one(&self.pool)
            .await?;

        Ok(result == "ok")
    }
}

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


use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use folio_core::store::models::SourceFile;
use folio_core::store::{annotations, Database, DocumentStore, StoreConfig};
use folio_core::{DocumentOrder, Library, ListOptions, ProgressTracker, TaskQueue, UploadPolicy};

#[derive(Parser)]
#[command(name = "folio-cli")]
#[command(about = "Folio library tool - inspect and exercise the document store", long_about = None)]
struct Cli {
    /// Path to the library database (defaults to the platform data dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a document into the library
    Add {
        /// File to import
        path: PathBuf,
        /// Skip the upload policy checks (size and type)
        #[arg(long)]
        force: bool,
    },
    /// List the library
    List {
        /// Sort order: name, newest, largest, recently-read
        #[arg(short, long, default_value = "newest")]
        order: String,
        /// Only show documents whose name contains this
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Show one document's metadata and annotations
    Show {
        /// Document id
        doc_id: String,
    },
    /// Record a reading position
    Progress {
        /// Document id
        doc_id: String,
        /// Page the reader is on (1-based)
        page: u32,
        /// Total pages in the document
        page_count: u32,
    },
    /// Attach annotations to a document (raw JSON)
    Annotate {
        /// Document id
        doc_id: String,
        /// Annotation body as a JSON string
        json: String,
    },
    /// Remove a document
    Remove {
        /// Document id
        doc_id: String,
    },
    /// Remove every document
    Clear,
    /// Show storage usage
    Usage,
    /// Show database path, file size and integrity
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = StoreConfig {
        database_path: cli.db.unwrap_or_else(Database::default_path),
        ..StoreConfig::default()
    };
    let db_path = config.database_path.clone();
    let store = Arc::new(DocumentStore::with_config(config));

    match cli.command {
        Commands::Add { path, force } => {
            let data = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document.pdf".to_string());
            let mime_type = match path.extension().and_then(|ext| ext.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("pdf") => "application/pdf",
                _ => "application/octet-stream",
            };
            let last_modified = tokio::fs::metadata(&path)
                .await
                .ok()
                .and_then(|meta| meta.modified().ok())
                .map(|modified| DateTime::<Utc>::from(modified).timestamp_millis())
                .unwrap_or_else(|| Utc::now().timestamp_millis());

            let file = SourceFile::new(name, mime_type, last_modified, data);
            if !force {
                UploadPolicy::new().check(&file)?;
            }

            let doc_id = store.save(file).await?;
            println!("Added {}", doc_id);
        }
        Commands::List { order, filter } => {
            let order = parse_order(&order)?;
            let library = Library::new(Arc::clone(&store));
            let records = library
                .list(&ListOptions {
                    order,
                    name_filter: filter,
                })
                .await?;

            if records.is_empty() {
                println!("Library is empty");
            }
            for record in records {
                println!(
                    "{}  {}  {:.2} MB  {:.0}%  uploaded {}",
                    record.doc_id,
                    record.name,
                    record.size_megabytes(),
                    record.reading_progress,
                    record.uploaded_at.format("%Y-%m-%d %H:%M"),
                );
            }
        }
        Commands::Show { doc_id } => {
            let document = store.get_by_id(&doc_id).await?;
            let record = document.record;
            println!("id:            {}", record.doc_id);
            println!("name:          {}", record.name);
            println!("size:          {} bytes ({:.2} MB)", record.size, record.size_megabytes());
            println!("type:          {}", record.mime_type);
            println!("uploaded:      {}", record.uploaded_at.to_rfc3339());
            println!("progress:      {:.1}%", record.reading_progress);
            println!("last page:     {}", record.last_read_page);
            match record.last_read_at {
                Some(at) => println!("last read:     {}", at.to_rfc3339()),
                None => println!("last read:     never"),
            }

            let pool = store.database().await?.pool();
            match annotations::get_annotations(pool, &doc_id).await? {
                Some(body) => println!("annotations:   {}", body),
                None => println!("annotations:   none"),
            }
        }
        Commands::Progress {
            doc_id,
            page,
            page_count,
        } => {
            let tracker = ProgressTracker::new(Arc::clone(&store), TaskQueue::new(2));
            tracker
                .record_page_change(Some(&doc_id), page, page_count)
                .await;
            tracker.flush().await;

            let record = store.get_by_id(&doc_id).await?.record;
            println!(
                "{} now at page {} ({:.1}%)",
                record.name, record.last_read_page, record.reading_progress
            );
        }
        Commands::Annotate { doc_id, json } => {
            let body: serde_json::Value =
                serde_json::from_str(&json).context("annotation body is not valid JSON")?;
            let pool = store.database().await?.pool();
            annotations::save_annotations(pool, &doc_id, &body).await?;
            println!("Annotations saved for {}", doc_id);
        }
        Commands::Remove { doc_id } => {
            store.delete(&doc_id).await?;
            println!("Removed {}", doc_id);
        }
        Commands::Clear => {
            store.clear_all().await?;
            println!("Library cleared");
        }
        Commands::Usage => {
            let usage = store.storage_usage().await?;
            println!(
                "{} documents, {} bytes ({:.2} MB)",
                usage.file_count,
                usage.total_bytes,
                usage.total_megabytes()
            );
        }
        Commands::Info => {
            let database = store.database().await?;
            println!("database:  {}", db_path.display());
            println!("file size: {} bytes", database.file_size().await?);
            let intact = database.check_integrity().await?;
            println!("integrity: {}", if intact { "ok" } else { "FAILED" });
        }
    }

    Ok(())
}

fn parse_order(order: &str) -> Result<DocumentOrder> {
    match order {
        "name" => Ok(DocumentOrder::Name),
        "newest" => Ok(DocumentOrder::Newest),
        "largest" => Ok(DocumentOrder::Largest),
        "recently-read" | "recently_read" => Ok(DocumentOrder::RecentlyRead),
        other => bail!("unknown sort order '{other}' (expected name, newest, largest, recently-read)"),
    }
}

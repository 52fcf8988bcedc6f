//! Storage module for persisting harvested records
//!
//! This module handles all database operations for the harvester:
//! - SQLite database initialization and schema management
//! - One durable row per model plus long-format spec rows
//! - Per-record transactional commit (a crash loses at most the record
//!   in flight, never part of one)
//! - Count queries backing the statistics report

mod schema;
mod sqlite;
mod traits;

pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::SqliteStore;
pub use traits::{RecordSink, StorageError, StorageResult};

use crate::Result;
use std::path::Path;

/// Initializes or opens the harvest database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized storage
/// * `Err(HarvestError)` - Failed to open or migrate the database
pub fn open_store(path: &Path) -> Result<SqliteStore> {
    SqliteStore::new(path)
}

/// One harvested model, the durable unit of output
///
/// Field names follow the harvester's vocabulary; the column names they map
/// to (`maker`, `maker_link`, ...) are kept compatible with the analysis
/// scripts that consume the database.
#[derive(Debug, Clone)]
pub struct ModelRecord {
    /// Generated UUID; the catalog has no stable id of its own
    pub id: String,
    pub vendor: String,
    pub vendor_url: String,
    pub model: String,
    pub model_url: String,
    pub esim_support: bool,
    /// Raw text of the SIM spec cell the flag was derived from
    pub sim_data: Option<String>,
    pub is_android: bool,
    /// Raw text of the OS spec cell the flag was derived from
    pub os_data: Option<String>,
    /// RFC 3339 timestamp of the detail-page fetch
    pub scraped_at: String,
}

//! Storage traits and error types
//!
//! This module defines the sink interface the walker writes through and the
//! associated error types.

use crate::storage::ModelRecord;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Sink for harvested records
///
/// The walker only talks to storage through this trait. The contract that
/// matters is `insert_model_with_specs`: a record and all of its spec rows
/// become visible together or not at all.
pub trait RecordSink {
    /// Inserts one model record
    fn insert_model_record(&mut self, record: &ModelRecord) -> StorageResult<()>;

    /// Inserts the long-format spec rows for a record
    fn insert_spec_rows(
        &mut self,
        record: &ModelRecord,
        specs: &BTreeMap<String, String>,
    ) -> StorageResult<()>;

    /// Inserts a record and its spec rows in one transaction
    fn insert_model_with_specs(
        &mut self,
        record: &ModelRecord,
        specs: &BTreeMap<String, String>,
    ) -> StorageResult<()>;

    // ===== Statistics =====

    /// Total model records
    fn count_models(&self) -> StorageResult<u64>;

    /// Total long-format spec rows
    fn count_spec_rows(&self) -> StorageResult<u64>;

    /// Model counts per vendor, most models first
    fn count_models_by_vendor(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Number of distinct spec keys seen across all models
    fn count_distinct_spec_keys(&self) -> StorageResult<u64>;

    /// Models flagged with eSIM support
    fn count_esim_models(&self) -> StorageResult<u64>;

    /// Models flagged as running Android
    fn count_android_models(&self) -> StorageResult<u64>;

    /// Spec rows whose model id has no committed record; always zero when
    /// the per-record commit contract holds
    fn count_orphaned_spec_rows(&self) -> StorageResult<u64>;
}

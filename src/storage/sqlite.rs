//! SQLite storage implementation
//!
//! This module provides the SQLite-backed implementation of [`RecordSink`].

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordSink, StorageError, StorageResult};
use crate::storage::ModelRecord;
use crate::Result;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::path::Path;

const INSERT_MODEL_SQL: &str = "INSERT INTO models_view \
     (unique_model_id, maker, maker_link, model_name, model_link, \
      esim_support, sim_data, is_android, os_data, scraped_at) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";

const INSERT_PARAM_SQL: &str = "INSERT INTO models_params \
     (unique_model_id, maker, model_name, param_name, param_value) \
     VALUES (?1, ?2, ?3, ?4, ?5)";

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better durability/performance balance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Borrow of the underlying connection, for the offline pivot step
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl RecordSink for SqliteStore {
    fn insert_model_record(&mut self, record: &ModelRecord) -> StorageResult<()> {
        self.conn.execute(
            INSERT_MODEL_SQL,
            params![
                record.id,
                record.vendor,
                record.vendor_url,
                record.model,
                record.model_url,
                record.esim_support,
                record.sim_data,
                record.is_android,
                record.os_data,
                record.scraped_at,
            ],
        )?;
        Ok(())
    }

    fn insert_spec_rows(
        &mut self,
        record: &ModelRecord,
        specs: &BTreeMap<String, String>,
    ) -> StorageResult<()> {
        let mut stmt = self.conn.prepare_cached(INSERT_PARAM_SQL)?;
        for (name, value) in specs {
            stmt.execute(params![record.id, record.vendor, record.model, name, value])?;
        }
        Ok(())
    }

    fn insert_model_with_specs(
        &mut self,
        record: &ModelRecord,
        specs: &BTreeMap<String, String>,
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            INSERT_MODEL_SQL,
            params![
                record.id,
                record.vendor,
                record.vendor_url,
                record.model,
                record.model_url,
                record.esim_support,
                record.sim_data,
                record.is_android,
                record.os_data,
                record.scraped_at,
            ],
        )?;

        {
            let mut stmt = tx.prepare_cached(INSERT_PARAM_SQL)?;
            for (name, value) in specs {
                stmt.execute(params![record.id, record.vendor, record.model, name, value])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn count_models(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM models_view")
    }

    fn count_spec_rows(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM models_params")
    }

    fn count_models_by_vendor(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT maker, COUNT(*) AS n FROM models_view GROUP BY maker ORDER BY n DESC, maker",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;
        let counts = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    fn count_distinct_spec_keys(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(DISTINCT param_name) FROM models_params")
    }

    fn count_esim_models(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM models_view WHERE esim_support = 1")
    }

    fn count_android_models(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM models_view WHERE is_android = 1")
    }

    fn count_orphaned_spec_rows(&self) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM models_params p \
             WHERE NOT EXISTS (SELECT 1 FROM models_view m \
                               WHERE m.unique_model_id = p.unique_model_id)",
        )
    }
}

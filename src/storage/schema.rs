//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the harvest database.
//! Column names are kept compatible with the downstream pivot step.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per harvested model
CREATE TABLE IF NOT EXISTS models_view (
    unique_model_id TEXT PRIMARY KEY,
    maker TEXT NOT NULL,
    maker_link TEXT,
    model_name TEXT NOT NULL,
    model_link TEXT,
    esim_support INTEGER NOT NULL DEFAULT 0,
    sim_data TEXT,
    is_android INTEGER NOT NULL DEFAULT 0,
    os_data TEXT,
    scraped_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_models_maker ON models_view(maker);

-- Long-format spec rows, zero or more per model
CREATE TABLE IF NOT EXISTS models_params (
    unique_model_id TEXT NOT NULL,
    maker TEXT,
    model_name TEXT,
    param_name TEXT NOT NULL,
    param_value TEXT,
    FOREIGN KEY (unique_model_id) REFERENCES models_view(unique_model_id)
);

CREATE INDEX IF NOT EXISTS idx_params_model ON models_params(unique_model_id);
CREATE INDEX IF NOT EXISTS idx_params_name ON models_params(param_name);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        let result = initialize_schema(&conn);
        assert!(result.is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        // Initialize twice
        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        // Should succeed the second time too
        assert!(result.is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["models_view", "models_params"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }
}

//! Offline pivot step: long-format spec rows into wide analysis tables
//!
//! Runs entirely against an existing harvest database, after the fact. Two
//! tables are produced:
//! - `pivoted_data`: one row per committed model (spec rows or not), the
//!   feature-flag columns carried over, and one column per distinct spec
//!   key, built with a generated `MAX(CASE WHEN ...)` projection.
//! - `pivoted_by_model`: `pivoted_data` expanded so each name in the
//!   comma-separated `models` spec cell gets its own row; the raw listing
//!   column itself is consumed by the split, not copied.
//!
//! Both tables are dropped and rebuilt on every invocation. Spec keys come
//! from page content, so they are escaped before being embedded in SQL as
//! string literals or column identifiers.

use crate::storage::StorageError;
use rusqlite::types::Value;
use rusqlite::Connection;

/// Rebuilds the wide `pivoted_data` table
///
/// # Arguments
///
/// * `conn` - Connection to the harvest database
///
/// # Returns
///
/// * `Ok(usize)` - Number of spec-key columns in the rebuilt table
/// * `Err(HarvestError)` - Failed to read keys or rebuild the table
pub fn build_pivot(conn: &Connection) -> crate::Result<usize> {
    let mut stmt = conn.prepare("SELECT DISTINCT param_name FROM models_params ORDER BY param_name")?;
    let keys: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<_, _>>()?;

    let mut columns = vec![
        "mv.unique_model_id AS unique_model_id".to_string(),
        "mv.maker AS maker".to_string(),
        "mv.model_name AS model_name".to_string(),
        "mv.esim_support AS esim_support".to_string(),
        "mv.sim_data AS sim_data".to_string(),
        "mv.is_android AS is_android".to_string(),
        "mv.os_data AS os_data".to_string(),
    ];
    for key in &keys {
        columns.push(format!(
            "MAX(CASE WHEN mp.param_name = '{}' THEN mp.param_value END) AS \"{}\"",
            quote_string(key),
            quote_identifier(key)
        ));
    }

    // LEFT JOIN so a model with zero spec rows still gets its row.
    let create_sql = format!(
        "CREATE TABLE pivoted_data AS \
         SELECT {} \
         FROM models_view mv \
         LEFT JOIN models_params mp ON mv.unique_model_id = mp.unique_model_id \
         GROUP BY mv.unique_model_id",
        columns.join(", ")
    );

    conn.execute("DROP TABLE IF EXISTS pivoted_data", [])?;
    conn.execute(&create_sql, [])?;

    tracing::info!("Rebuilt pivoted_data with {} spec-key columns", keys.len());
    Ok(keys.len())
}

/// Rebuilds `pivoted_by_model` from `pivoted_data`
///
/// Each row of `pivoted_data` becomes one row per name in its `models`
/// cell; rows without one fall back to the `model_name` column. The source
/// row's columns other than the raw `models` listing are carried over
/// unchanged after the new `model` column.
///
/// # Arguments
///
/// * `conn` - Connection to the harvest database
///
/// # Returns
///
/// * `Ok(usize)` - Number of rows written
/// * `Err(HarvestError)` - `pivoted_data` is missing or the rebuild failed
pub fn build_pivot_by_model(conn: &Connection) -> crate::Result<usize> {
    let columns = table_columns(conn, "pivoted_data")?;
    if columns.is_empty() {
        return Err(StorageError::Backend(
            "pivoted_data does not exist; build the pivot table first".to_string(),
        )
        .into());
    }

    let models_idx = columns.iter().position(|c| c == "models");
    let model_name_idx = columns.iter().position(|c| c == "model_name");

    // The split consumes the raw listing; it does not reappear as a column.
    let base_indices: Vec<usize> = (0..columns.len())
        .filter(|i| Some(*i) != models_idx)
        .collect();

    let mut quoted = vec!["\"model\"".to_string()];
    quoted.extend(
        base_indices
            .iter()
            .map(|&i| format!("\"{}\"", quote_identifier(&columns[i]))),
    );
    let create_sql = format!("CREATE TABLE pivoted_by_model ({})", quoted.join(", "));

    conn.execute("DROP TABLE IF EXISTS pivoted_by_model", [])?;
    conn.execute(&create_sql, [])?;

    // Materialize the source rows before writing so only one statement is
    // active on the connection at a time.
    let rows: Vec<Vec<Value>> = {
        let mut stmt = conn.prepare("SELECT * FROM pivoted_data")?;
        let column_count = stmt.column_count();
        let mut out = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(row.get::<_, Value>(i)?);
            }
            out.push(values);
        }
        out
    };

    let placeholders: Vec<String> = (1..=base_indices.len() + 1)
        .map(|i| format!("?{}", i))
        .collect();
    let insert_sql = format!(
        "INSERT INTO pivoted_by_model VALUES ({})",
        placeholders.join(", ")
    );

    let tx = conn.unchecked_transaction()?;
    let mut written = 0usize;
    {
        let mut stmt = tx.prepare(&insert_sql)?;
        for values in &rows {
            for name in variant_names(values, models_idx, model_name_idx) {
                let mut row_params: Vec<Value> = Vec::with_capacity(base_indices.len() + 1);
                row_params.push(Value::Text(name));
                row_params.extend(base_indices.iter().map(|&i| values[i].clone()));
                stmt.execute(rusqlite::params_from_iter(row_params))?;
                written += 1;
            }
        }
    }
    tx.commit()?;

    tracing::info!("Rebuilt pivoted_by_model with {} rows", written);
    Ok(written)
}

/// Column names of a table, in declaration order; empty when the table
/// does not exist
fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!(
        "PRAGMA table_info(\"{}\")",
        quote_identifier(table)
    ))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<_, _>>()?;
    Ok(columns)
}

/// Names one source row expands into: the split `models` listing when it
/// has one, otherwise the `model_name` column
fn variant_names(
    values: &[Value],
    models_idx: Option<usize>,
    model_name_idx: Option<usize>,
) -> Vec<String> {
    if let Some(idx) = models_idx {
        if let Some(Value::Text(listing)) = values.get(idx) {
            let names: Vec<String> = listing
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
            if !names.is_empty() {
                return names;
            }
        }
    }

    let fallback = model_name_idx
        .and_then(|idx| match values.get(idx) {
            Some(Value::Text(name)) => Some(name.clone()),
            _ => None,
        })
        .unwrap_or_default();
    vec![fallback]
}

fn quote_string(s: &str) -> String {
    s.replace('\'', "''")
}

fn quote_identifier(s: &str) -> String {
    s.replace('"', "\"\"")
}

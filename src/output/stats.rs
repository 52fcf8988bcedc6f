//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::storage::RecordSink;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Total number of committed model records
    pub total_models: u64,

    /// Total number of long-format spec rows
    pub total_spec_rows: u64,

    /// Number of distinct spec keys across all models
    pub distinct_spec_keys: u64,

    /// Model counts per vendor, most models first
    pub models_per_vendor: Vec<(String, u64)>,

    /// Models flagged with eSIM support
    pub esim_models: u64,

    /// Models flagged as running Android
    pub android_models: u64,

    /// Spec rows without a committed model record; nonzero means the
    /// per-record commit contract was violated
    pub orphaned_spec_rows: u64,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `sink` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(sink: &dyn RecordSink) -> crate::Result<HarvestStatistics> {
    let total_models = sink.count_models()?;
    let total_spec_rows = sink.count_spec_rows()?;
    let distinct_spec_keys = sink.count_distinct_spec_keys()?;
    let models_per_vendor = sink.count_models_by_vendor()?;
    let esim_models = sink.count_esim_models()?;
    let android_models = sink.count_android_models()?;
    let orphaned_spec_rows = sink.count_orphaned_spec_rows()?;

    Ok(HarvestStatistics {
        total_models,
        total_spec_rows,
        distinct_spec_keys,
        models_per_vendor,
        esim_models,
        android_models,
        orphaned_spec_rows,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Model records: {}", stats.total_models);
    println!("  Spec rows: {}", stats.total_spec_rows);
    println!("  Distinct spec keys: {}", stats.distinct_spec_keys);
    println!();

    if !stats.models_per_vendor.is_empty() {
        println!("Models by Vendor:");
        for (vendor, count) in &stats.models_per_vendor {
            let percentage = if stats.total_models > 0 {
                (*count as f64 / stats.total_models as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", vendor, count, percentage);
        }
        println!();
    }

    println!("Feature Flags:");
    println!("  eSIM support: {}", stats.esim_models);
    println!("  Android: {}", stats.android_models);
    println!();

    if stats.orphaned_spec_rows == 0 {
        println!("Integrity: OK (no orphaned spec rows)");
    } else {
        println!(
            "Integrity: {} orphaned spec rows found",
            stats.orphaned_spec_rows
        );
    }
}

//! Output module for reporting and reshaping harvested data
//!
//! This module handles:
//! - Statistics summaries of a harvest database
//! - The offline pivot step that reshapes long-format spec rows into wide
//!   analysis tables

mod pivot;
pub mod stats;

pub use pivot::{build_pivot, build_pivot_by_model};
pub use stats::{load_statistics, print_statistics, HarvestStatistics};

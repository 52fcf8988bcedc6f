//! Configuration module for Arena-Harvest
//!
//! Compiled-in defaults cover the live catalog and a local Tor daemon; a TOML
//! file given on the command line overrides them per section.
//!
//! # Example
//!
//! ```no_run
//! use arena_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Whitelisted vendors: {}", config.catalog.vendor_whitelist.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CatalogConfig, Config, FetchConfig, OutputConfig, ProxyConfig, TorConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, default_config, load_config, load_config_with_hash};

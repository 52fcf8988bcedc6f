//! Arena-Harvest main entry point
//!
//! This is the command-line interface for the Arena-Harvest catalog scraper.

use arena_harvest::config::{default_config, load_config_with_hash};
use arena_harvest::crawler::run_harvest;
use arena_harvest::Config;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Arena-Harvest: a patient phone-spec catalog scraper
///
/// Arena-Harvest walks a phone catalog (vendor index, paginated model
/// listings, detail pages) through a Tor SOCKS proxy, rotating the Tor
/// circuit whenever the site pushes back, and commits one record per model
/// to SQLite.
#[derive(Parser, Debug)]
#[command(name = "arena-harvest")]
#[command(version = "0.4.0")]
#[command(about = "A patient phone-spec catalog scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without fetching
    #[arg(long, conflicts_with_all = ["stats", "pivot"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "pivot"])]
    stats: bool,

    /// Rebuild the wide pivot tables from stored spec rows and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    pivot: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => {
            tracing::info!("No configuration file given, using built-in defaults");
            default_config()?
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.pivot {
        handle_pivot(&config)?;
    } else {
        handle_harvest(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("arena_harvest=info,warn"),
            1 => EnvFilter::new("arena_harvest=debug,info"),
            2 => EnvFilter::new("arena_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be walked
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Arena-Harvest Dry Run ===\n");

    println!("Catalog:");
    println!("  Base URL: {}", config.catalog.base_url);
    println!(
        "  Vendor index: {}{}",
        config.catalog.base_url, config.catalog.makers_path
    );
    println!(
        "  Whitelist fragments ({}):",
        config.catalog.vendor_whitelist.len()
    );
    for fragment in &config.catalog.vendor_whitelist {
        println!("    - {}", fragment);
    }

    println!("\nProxy:");
    match &config.proxy.socks_url {
        Some(socks) => println!("  SOCKS proxy: {}", socks),
        None => println!("  SOCKS proxy: none (direct connection)"),
    }
    println!("  User-Agent: {}", config.proxy.user_agent);

    println!("\nTor Control:");
    println!("  Control address: {}", config.tor.control_addr);
    println!("  Cooldown after rotation: {}s", config.tor.cooldown_secs);

    println!("\nFetch Policy:");
    println!("  Attempt budget: {}", config.fetch.max_attempts);
    println!("  Request timeout: {}s", config.fetch.request_timeout_secs);
    println!(
        "  Pause after success: {}-{}s",
        config.fetch.pause_secs_min, config.fetch.pause_secs_max
    );
    println!("  Rotate on any error: {}", config.fetch.rotate_on_any_error);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would filter vendors against {} whitelist fragments",
        config.catalog.vendor_whitelist.len()
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use anyhow::Context;
    use arena_harvest::output::{load_statistics, print_statistics};
    use arena_harvest::storage::open_store;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let store = open_store(Path::new(&config.output.database_path))
        .with_context(|| format!("opening {}", config.output.database_path))?;

    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --pivot mode: rebuilds the wide analysis tables
fn handle_pivot(config: &Config) -> anyhow::Result<()> {
    use anyhow::Context;
    use arena_harvest::output::{build_pivot, build_pivot_by_model};
    use arena_harvest::storage::open_store;
    use std::path::Path;

    println!("=== Rebuilding Pivot Tables ===\n");
    println!("Database: {}\n", config.output.database_path);

    let store = open_store(Path::new(&config.output.database_path))
        .with_context(|| format!("opening {}", config.output.database_path))?;

    let key_columns = build_pivot(store.connection())?;
    println!("✓ pivoted_data rebuilt ({} spec-key columns)", key_columns);

    let rows = build_pivot_by_model(store.connection())?;
    println!("✓ pivoted_by_model rebuilt ({} rows)", rows);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Whitelist fragments: {}, attempt budget: {}, proxy: {}",
        config.catalog.vendor_whitelist.len(),
        config.fetch.max_attempts,
        config.proxy.socks_url.as_deref().unwrap_or("direct")
    );

    match run_harvest(config).await {
        Ok(()) => {
            tracing::info!("Harvest completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}

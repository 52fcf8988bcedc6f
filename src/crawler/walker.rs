//! Catalog walker - main harvest orchestration logic
//!
//! This module contains the main harvest loop that coordinates all aspects
//! of the walk, including:
//! - Fetching the vendor index and filtering it against the whitelist
//! - Paginating each vendor's model listing
//! - Fetching and parsing model detail pages
//! - Composing records and handing them to the sink
//!
//! The walk is strictly sequential. One request is in flight at a time, so
//! an identity rotation never invalidates a concurrent request's circuit,
//! and the inter-request pause bounds the request rate by construction.

use crate::config::Config;
use crate::crawler::catalog::{
    parse_detail_page, parse_model_list, parse_vendor_list, ModelRef, Vendor,
};
use crate::crawler::fetcher::{build_http_client, FetchError, Fetcher};
use crate::crawler::paging::VendorPaging;
use crate::storage::{open_store, ModelRecord, RecordSink};
use crate::tor::{Rotate, TorController};
use crate::{ConfigError, HarvestError};
use std::path::Path;
use url::Url;
use uuid::Uuid;

/// Checks a vendor name against the whitelist
///
/// Matching is case-insensitive substring containment: a fragment like
/// `samsung` matches "Samsung Electronics". Fragments are containment
/// checks, not exact names, so a short fragment can overmatch (`son`
/// matches both Sony and Samsonite); the overmatch is accepted.
pub fn whitelist_match(name: &str, whitelist: &[String]) -> bool {
    let lowered = name.to_lowercase();
    whitelist
        .iter()
        .any(|fragment| lowered.contains(&fragment.to_lowercase()))
}

/// Main catalog walker structure
///
/// Holds the shared context for one run: the configuration, the fetcher
/// (HTTP client plus rotator), and the record sink. Constructed once at
/// process start and driven by [`Walker::run`].
pub struct Walker<R, S> {
    config: Config,
    base_url: Url,
    fetcher: Fetcher<R>,
    sink: S,
}

impl<R: Rotate, S: RecordSink> Walker<R, S> {
    /// Creates a new walker instance
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `fetcher` - Fetcher used for every page request
    /// * `sink` - Record sink that receives committed records
    ///
    /// # Returns
    ///
    /// * `Ok(Walker)` - Successfully created walker
    /// * `Err(HarvestError)` - The configured base URL does not parse
    pub fn new(config: Config, fetcher: Fetcher<R>, sink: S) -> crate::Result<Self> {
        let base_url = Url::parse(&config.catalog.base_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("{}: {}", config.catalog.base_url, e))
        })?;

        Ok(Self {
            config,
            base_url,
            fetcher,
            sink,
        })
    }

    /// Runs the main harvest loop
    ///
    /// This is the core walk logic that:
    /// 1. Fetches the vendor index page
    /// 2. Filters vendors against the whitelist
    /// 3. Paginates each vendor's listing until a page yields no models
    /// 4. Fetches each model's detail page and commits one record per model
    ///
    /// Only two failures end the run: the vendor index fetch exhausting its
    /// budget (nothing to iterate without it) and the rotation channel
    /// becoming unusable. Everything else is logged and skipped.
    pub async fn run(&mut self) -> crate::Result<()> {
        let start_time = std::time::Instant::now();
        let index_url = format!(
            "{}{}",
            self.config.catalog.base_url, self.config.catalog.makers_path
        );

        tracing::info!("Fetching vendor index {}", index_url);
        let body = self.fetcher.fetch(&index_url).await?;
        let vendors = parse_vendor_list(&body, &self.base_url);
        tracing::info!("Vendor index lists {} vendors", vendors.len());

        let mut committed: u64 = 0;

        for vendor in &vendors {
            if !whitelist_match(&vendor.name, &self.config.catalog.vendor_whitelist) {
                tracing::debug!("Skipping {} (not whitelisted)", vendor.name);
                continue;
            }

            committed += self.walk_vendor(vendor).await?;
        }

        tracing::info!(
            "Harvest completed: {} records committed in {:?}",
            committed,
            start_time.elapsed()
        );

        Ok(())
    }

    /// Walks one vendor's paginated model listing
    ///
    /// Page 1 uses the vendor's catalog link verbatim; later pages come
    /// from the parsed paging model. Pagination stops at the first page
    /// that lists no models, or when a listing fetch exhausts its budget
    /// (treated as end of this vendor, never as a run failure).
    ///
    /// Returns the number of records committed for this vendor.
    async fn walk_vendor(&mut self, vendor: &Vendor) -> crate::Result<u64> {
        tracing::info!("Walking vendor {} ({})", vendor.name, vendor.url);

        // Parsed once per vendor; later pages reuse it.
        let paging = match VendorPaging::parse(&vendor.url) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(
                    "Unrecognized listing link shape for {}: {}; walking the first page only",
                    vendor.name,
                    e
                );
                None
            }
        };

        let mut committed: u64 = 0;
        let mut page: u32 = 1;

        loop {
            let page_url = if page == 1 {
                vendor.url.clone()
            } else {
                match &paging {
                    Some(p) => p.page_url(page),
                    None => break,
                }
            };

            let body = match self.fetcher.fetch(&page_url).await {
                Ok(body) => body,
                Err(FetchError::Exhausted { url, attempts }) => {
                    tracing::warn!(
                        "Listing fetch exhausted for {} after {} attempts, treating as end of {}",
                        url,
                        attempts,
                        vendor.name
                    );
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            let models = parse_model_list(&body, &self.base_url);
            if models.is_empty() {
                tracing::info!("{} page {} lists no models, vendor done", vendor.name, page);
                break;
            }

            tracing::info!("{} page {} lists {} models", vendor.name, page, models.len());

            for model in &models {
                match self.harvest_model(vendor, model).await {
                    Ok(true) => committed += 1,
                    Ok(false) => {}
                    Err(e @ HarvestError::Tor(_)) => return Err(e),
                    Err(e) => tracing::error!("Error processing {}: {}", model.url, e),
                }
            }

            page += 1;
        }

        Ok(committed)
    }

    /// Fetches, parses, and commits a single model
    ///
    /// Returns `Ok(true)` when a record was committed and `Ok(false)` when
    /// the detail fetch was exhausted and the model skipped.
    async fn harvest_model(&mut self, vendor: &Vendor, model: &ModelRef) -> crate::Result<bool> {
        let body = match self.fetcher.fetch(&model.url).await {
            Ok(body) => body,
            Err(FetchError::Exhausted { url, attempts }) => {
                tracing::warn!("Skipping {} after {} exhausted attempts", url, attempts);
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let details = parse_detail_page(&body);
        let record = ModelRecord {
            id: Uuid::new_v4().to_string(),
            vendor: vendor.name.clone(),
            vendor_url: vendor.url.clone(),
            model: model.name.clone(),
            model_url: model.url.clone(),
            esim_support: details.esim.present,
            sim_data: details.esim.raw,
            is_android: details.os.present,
            os_data: details.os.raw,
            scraped_at: chrono::Utc::now().to_rfc3339(),
        };

        self.sink.insert_model_with_specs(&record, &details.specs)?;
        tracing::info!(
            "Committed {} {} ({} spec rows)",
            record.vendor,
            record.model,
            details.specs.len()
        );

        Ok(true)
    }
}

/// Runs the main harvest operation
///
/// This function wires up the whole run:
///
/// 1. Build the HTTP client (SOCKS proxy, User-Agent, timeouts)
/// 2. Connect the identity rotator to the Tor control port settings
/// 3. Open or create the output database
/// 4. Walk the catalog and commit one record per harvested model
///
/// # Arguments
///
/// * `config` - The harvester configuration
///
/// # Returns
///
/// * `Ok(())` - Harvest completed successfully
/// * `Err(HarvestError)` - Harvest failed with an error
///
/// # Example
///
/// ```no_run
/// use arena_harvest::config::default_config;
/// use arena_harvest::crawler::run_harvest;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = default_config()?;
/// run_harvest(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config) -> crate::Result<()> {
    let client = build_http_client(&config.proxy, &config.fetch)?;
    let controller = TorController::new(&config.tor);
    let fetcher = Fetcher::new(client, controller, &config.fetch);
    let store = open_store(Path::new(&config.output.database_path))?;

    let mut walker = Walker::new(config, fetcher, store)?;
    walker.run().await
}

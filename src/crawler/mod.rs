//! Crawler module for catalog fetching and walking
//!
//! This module contains the fetch-and-recover retrieval loop, including:
//! - HTTP fetching with bounded retries and identity rotation
//! - Catalog page parsing (vendor index, model listings, detail pages)
//! - Pagination address construction per vendor
//! - Overall harvest orchestration

mod catalog;
mod fetcher;
mod paging;
mod walker;

pub use catalog::{
    parse_detail_page, parse_model_list, parse_vendor_list, FeatureFlag, ModelDetails, ModelRef,
    Vendor,
};
pub use fetcher::{build_http_client, FetchError, Fetcher, RetryReason};
pub use paging::{PagingError, VendorPaging};
pub use walker::{run_harvest, whitelist_match, Walker};

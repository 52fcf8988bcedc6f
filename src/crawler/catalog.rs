//! Catalog page extraction
//!
//! This module knows the three page shapes the walker visits:
//! - the vendor index (`div.st-text` anchor list)
//! - a vendor's paginated model listing (`div.makers` list items)
//! - a model detail page (`#specs-list` cells tagged with `data-spec`)
//!
//! Extraction is tolerant by construction: a page that does not match a
//! shape yields an empty result rather than an error, and the walker's
//! empty-page sentinel takes it from there.

use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use url::Url;

/// A vendor entry from the index page
#[derive(Debug, Clone, PartialEq)]
pub struct Vendor {
    pub name: String,
    pub url: String,
}

/// A model entry from a vendor listing page
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRef {
    pub name: String,
    pub url: String,
}

/// A boolean feature derived from one spec cell, with the raw cell text
/// kept for auditing
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFlag {
    pub present: bool,
    pub raw: Option<String>,
}

impl FeatureFlag {
    fn absent() -> Self {
        Self {
            present: false,
            raw: None,
        }
    }
}

/// Everything extracted from one model detail page
#[derive(Debug, Clone)]
pub struct ModelDetails {
    /// Spec key/value pairs from every `data-spec` tagged cell
    pub specs: BTreeMap<String, String>,
    /// eSIM capability, from the SIM cell
    pub esim: FeatureFlag,
    /// Android flag, from the OS cell
    pub os: FeatureFlag,
}

/// Parses the vendor index page into (name, link) pairs
///
/// Vendor anchors carry a device-count `<span>` after the name; only the
/// anchor's own text nodes make up the name. Relative hrefs are resolved
/// against the catalog base URL.
pub fn parse_vendor_list(html: &str, base_url: &Url) -> Vec<Vendor> {
    let document = Html::parse_document(html);
    let mut vendors = Vec::new();

    if let Ok(selector) = Selector::parse("div.st-text a[href]") {
        for element in document.select(&selector) {
            let name = direct_text(&element);
            if name.is_empty() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve_href(href, base_url) {
                    vendors.push(Vendor { name, url });
                }
            }
        }
    }

    vendors
}

/// Parses one listing page into model (name, link) pairs
///
/// An empty result is the end-of-pagination sentinel the walker stops on.
pub fn parse_model_list(html: &str, base_url: &Url) -> Vec<ModelRef> {
    let document = Html::parse_document(html);
    let mut models = Vec::new();

    if let Ok(selector) = Selector::parse("div.makers li a[href]") {
        for element in document.select(&selector) {
            let name = model_name(&element);
            if name.is_empty() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve_href(href, base_url) {
                    models.push(ModelRef { name, url });
                }
            }
        }
    }

    models
}

/// Parses a model detail page into spec pairs and feature flags
pub fn parse_detail_page(html: &str) -> ModelDetails {
    let document = Html::parse_document(html);

    ModelDetails {
        specs: spec_pairs(&document),
        esim: feature_flag(&document, "sim", "esim"),
        os: feature_flag(&document, "os", "android"),
    }
}

/// All `data-spec` tagged cells under the spec list, keyed by their tag.
/// A key appearing twice keeps the last value.
fn spec_pairs(document: &Html) -> BTreeMap<String, String> {
    let mut specs = BTreeMap::new();

    if let Ok(selector) = Selector::parse("#specs-list td.nfo[data-spec]") {
        for element in document.select(&selector) {
            if let Some(key) = element.value().attr("data-spec") {
                if !key.is_empty() {
                    specs.insert(key.to_string(), joined_text(&element));
                }
            }
        }
    }

    specs
}

/// Derives one feature flag from the spec cell tagged `spec_key`: present
/// when the cell text contains `needle` case-insensitively.
fn feature_flag(document: &Html, spec_key: &str, needle: &str) -> FeatureFlag {
    let selector = format!("td.nfo[data-spec=\"{}\"]", spec_key);
    if let Ok(selector) = Selector::parse(&selector) {
        if let Some(element) = document.select(&selector).next() {
            let raw = joined_text(&element);
            let present = raw.to_lowercase().contains(needle);
            return FeatureFlag {
                present,
                raw: Some(raw),
            };
        }
    }
    FeatureFlag::absent()
}

/// Text of the element's own text nodes, skipping child elements such as
/// the device-count span inside vendor anchors
fn direct_text(element: &ElementRef) -> String {
    let mut parts = Vec::new();
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            parts.push(text.to_string());
        }
    }
    normalize_ws(&parts.join(" "))
}

/// Listing entries put the visible name in a `<strong>` child; fall back
/// to the whole anchor text when it is missing
fn model_name(element: &ElementRef) -> String {
    if let Ok(strong) = Selector::parse("strong") {
        if let Some(node) = element.select(&strong).next() {
            return normalize_ws(&node.text().collect::<Vec<_>>().join(" "));
        }
    }
    normalize_ws(&element.text().collect::<Vec<_>>().join(" "))
}

/// All descendant text joined with single spaces, `<br>` seams included
fn joined_text(element: &ElementRef) -> String {
    let parts: Vec<&str> = element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    normalize_ws(&parts.join(" "))
}

fn normalize_ws(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn resolve_href(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://catalog.example.com/").unwrap()
    }

    #[test]
    fn test_parse_vendor_list() {
        let html = r#"
            <html><body>
            <div class="st-text">
                <table><tr>
                    <td><a href="samsung-phones-9.php">Samsung<br><span>1423 devices</span></a></td>
                    <td><a href="nokia-phones-1.php">Nokia<br><span>470 devices</span></a></td>
                </tr></table>
            </div>
            </body></html>
        "#;

        let vendors = parse_vendor_list(html, &base_url());
        assert_eq!(vendors.len(), 2);
        assert_eq!(vendors[0].name, "Samsung");
        assert_eq!(
            vendors[0].url,
            "https://catalog.example.com/samsung-phones-9.php"
        );
        assert_eq!(vendors[1].name, "Nokia");
    }

    #[test]
    fn test_vendor_name_excludes_device_count() {
        let html = r#"
            <div class="st-text">
                <a href="lg-phones-20.php">LG<br><span>654 devices</span></a>
            </div>
        "#;

        let vendors = parse_vendor_list(html, &base_url());
        assert_eq!(vendors.len(), 1);
        assert_eq!(vendors[0].name, "LG");
    }

    #[test]
    fn test_vendor_list_missing_block() {
        let html = r#"<html><body><p>maintenance page</p></body></html>"#;
        assert!(parse_vendor_list(html, &base_url()).is_empty());
    }

    #[test]
    fn test_parse_model_list() {
        let html = r#"
            <div class="makers">
            <ul>
                <li><a href="samsung_galaxy_a55-12824.php"><img src="thumb.jpg">
                    <strong><span>Galaxy A55</span></strong></a></li>
                <li><a href="samsung_galaxy_s24-12773.php"><img src="thumb.jpg">
                    <strong><span>Galaxy S24</span></strong></a></li>
            </ul>
            </div>
        "#;

        let models = parse_model_list(html, &base_url());
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "Galaxy A55");
        assert_eq!(
            models[0].url,
            "https://catalog.example.com/samsung_galaxy_a55-12824.php"
        );
    }

    #[test]
    fn test_model_list_empty_page_is_sentinel() {
        let html = r#"<div class="makers"><ul></ul></div>"#;
        assert!(parse_model_list(html, &base_url()).is_empty());

        let html = r#"<html><body>nothing here</body></html>"#;
        assert!(parse_model_list(html, &base_url()).is_empty());
    }

    #[test]
    fn test_parse_detail_specs() {
        let html = r#"
            <div id="specs-list">
            <table>
                <tr><td class="ttl">OS</td>
                    <td class="nfo" data-spec="os">Android 13, One UI 5</td></tr>
                <tr><td class="ttl">Display</td>
                    <td class="nfo" data-spec="displaytype">Super AMOLED</td></tr>
                <tr><td class="ttl">Untagged</td>
                    <td class="nfo">ignored</td></tr>
            </table>
            </div>
        "#;

        let details = parse_detail_page(html);
        assert_eq!(details.specs.len(), 2);
        assert_eq!(details.specs["os"], "Android 13, One UI 5");
        assert_eq!(details.specs["displaytype"], "Super AMOLED");
    }

    #[test]
    fn test_spec_cell_text_joined_across_breaks() {
        let html = r#"
            <div id="specs-list"><table><tr>
                <td class="nfo" data-spec="batdescription1">5000 mAh<br>25W wired</td>
            </tr></table></div>
        "#;

        let details = parse_detail_page(html);
        assert_eq!(details.specs["batdescription1"], "5000 mAh 25W wired");
    }

    #[test]
    fn test_esim_flag_detected() {
        let html = r#"
            <div id="specs-list"><table><tr>
                <td class="nfo" data-spec="sim">Nano-SIM and eSIM</td>
            </tr></table></div>
        "#;

        let details = parse_detail_page(html);
        assert!(details.esim.present);
        assert_eq!(details.esim.raw.as_deref(), Some("Nano-SIM and eSIM"));
    }

    #[test]
    fn test_esim_flag_absent_from_text() {
        let html = r#"
            <div id="specs-list"><table><tr>
                <td class="nfo" data-spec="sim">Dual SIM (Nano-SIM)</td>
            </tr></table></div>
        "#;

        let details = parse_detail_page(html);
        assert!(!details.esim.present);
        assert_eq!(details.esim.raw.as_deref(), Some("Dual SIM (Nano-SIM)"));
    }

    #[test]
    fn test_android_flag_case_insensitive() {
        let html = r#"
            <div id="specs-list"><table><tr>
                <td class="nfo" data-spec="os">ANDROID 14</td>
            </tr></table></div>
        "#;

        let details = parse_detail_page(html);
        assert!(details.os.present);
    }

    #[test]
    fn test_non_android_os() {
        let html = r#"
            <div id="specs-list"><table><tr>
                <td class="nfo" data-spec="os">iOS 17</td>
            </tr></table></div>
        "#;

        let details = parse_detail_page(html);
        assert!(!details.os.present);
        assert_eq!(details.os.raw.as_deref(), Some("iOS 17"));
    }

    #[test]
    fn test_missing_cells_leave_flags_absent() {
        let details = parse_detail_page("<html><body></body></html>");
        assert!(!details.esim.present);
        assert!(details.esim.raw.is_none());
        assert!(!details.os.present);
        assert!(details.os.raw.is_none());
        assert!(details.specs.is_empty());
    }

    #[test]
    fn test_duplicate_spec_key_keeps_last() {
        let html = r#"
            <div id="specs-list"><table>
                <tr><td class="nfo" data-spec="memoryinternal">128GB 8GB RAM</td></tr>
                <tr><td class="nfo" data-spec="memoryinternal">256GB 12GB RAM</td></tr>
            </table></div>
        "#;

        let details = parse_detail_page(html);
        assert_eq!(details.specs["memoryinternal"], "256GB 12GB RAM");
    }
}

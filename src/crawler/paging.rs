//! Vendor pagination address model
//!
//! A vendor link from the index looks like
//! `https://…/samsung-phones-9.php`: a path prefix, the literal `-phones-`
//! marker, and the site-internal vendor id. Listing pages past the first
//! live at `{prefix}-phones-f-{vendor_id}-0-p{N}.php`. The link is split
//! once when the vendor is discovered; page addresses are then pure string
//! formatting with nothing left to go wrong per page.

use thiserror::Error;

/// A vendor link that does not fit the pageable shape
///
/// Vendor-scoped and non-fatal: the walker still visits page 1 through the
/// link verbatim and simply cannot go past it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PagingError {
    #[error("vendor link '{0}' has no '-phones-' segment")]
    MissingPhonesSegment(String),

    #[error("vendor link '{0}' has no '.php' suffix after the vendor id")]
    MissingPhpSuffix(String),
}

/// Parsed form of a pageable vendor link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorPaging {
    prefix: String,
    vendor_id: String,
}

impl VendorPaging {
    /// Splits a vendor link into its path prefix and vendor id
    ///
    /// # Example
    ///
    /// ```
    /// use arena_harvest::crawler::VendorPaging;
    ///
    /// let paging = VendorPaging::parse("https://x.test/samsung-phones-9.php").unwrap();
    /// assert_eq!(paging.page_url(3), "https://x.test/samsung-phones-f-9-0-p3.php");
    /// ```
    pub fn parse(link: &str) -> Result<Self, PagingError> {
        let (prefix, rest) = link
            .split_once("-phones-")
            .ok_or_else(|| PagingError::MissingPhonesSegment(link.to_string()))?;

        let (vendor_id, _) = rest
            .split_once(".php")
            .ok_or_else(|| PagingError::MissingPhpSuffix(link.to_string()))?;

        Ok(Self {
            prefix: prefix.to_string(),
            vendor_id: vendor_id.to_string(),
        })
    }

    /// Address of listing page `page`
    ///
    /// Only meaningful for `page >= 2`; page 1 is always the vendor's own
    /// link, fetched verbatim by the walker.
    pub fn page_url(&self, page: u32) -> String {
        format!(
            "{}-phones-f-{}-0-p{}.php",
            self.prefix, self.vendor_id, page
        )
    }

    /// The site-internal vendor id embedded in the link
    pub fn vendor_id(&self) -> &str {
        &self.vendor_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_link() {
        let paging = VendorPaging::parse("https://www.gsmarena.com/samsung-phones-9.php").unwrap();
        assert_eq!(paging.vendor_id(), "9");
        assert_eq!(
            paging.page_url(2),
            "https://www.gsmarena.com/samsung-phones-f-9-0-p2.php"
        );
    }

    #[test]
    fn test_page_url_format() {
        let paging = VendorPaging::parse("https://x.test/nokia-phones-1.php").unwrap();
        assert_eq!(paging.page_url(2), "https://x.test/nokia-phones-f-1-0-p2.php");
        assert_eq!(
            paging.page_url(17),
            "https://x.test/nokia-phones-f-1-0-p17.php"
        );
    }

    #[test]
    fn test_multi_word_vendor_slug() {
        let paging = VendorPaging::parse("https://x.test/t-mobile-phones-58.php").unwrap();
        assert_eq!(paging.vendor_id(), "58");
        assert_eq!(
            paging.page_url(2),
            "https://x.test/t-mobile-phones-f-58-0-p2.php"
        );
    }

    #[test]
    fn test_missing_phones_segment() {
        let err = VendorPaging::parse("https://x.test/news.php3").unwrap_err();
        assert!(matches!(err, PagingError::MissingPhonesSegment(_)));
    }

    #[test]
    fn test_missing_php_suffix() {
        let err = VendorPaging::parse("https://x.test/samsung-phones-9").unwrap_err();
        assert!(matches!(err, PagingError::MissingPhpSuffix(_)));
    }

    #[test]
    fn test_query_suffix_tolerated() {
        // Anything after .php is irrelevant to the split
        let paging = VendorPaging::parse("https://x.test/sony-phones-7.php?ref=home").unwrap();
        assert_eq!(paging.vendor_id(), "7");
    }
}

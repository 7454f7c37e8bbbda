//! Source-specific structural extraction of listing pages.
//!
//! Each marketplace gets its own implementation of [`SourceExtractor`]:
//! independent variants of one contract, selected by source identity. A
//! failed field lookup yields an absent field, a placeholder unit is
//! skipped, and a page that failed to load extracts as zero items; none of
//! these abort the sibling items or the page.

mod amazon;
mod ebay;

pub use amazon::AmazonExtractor;
pub use ebay::EbayExtractor;

use scraper::{ElementRef, Selector};

use crate::types::Source;

/// How a source's pages must be retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Plain HTTP; the markup is complete as served.
    Static,
    /// Listings appear only after JavaScript execution; needs the browser.
    Rendered,
}

/// Unparsed field text for one listing unit, as found in the markup.
#[derive(Debug, Default, Clone)]
pub struct RawListing {
    pub title: Option<String>,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub review_count: Option<String>,
    pub shipping: Option<String>,
}

/// Structural extraction rules for one marketplace.
pub trait SourceExtractor: Send + Sync {
    fn source(&self) -> Source;

    fn fetch_mode(&self) -> FetchMode;

    /// Readiness landmark for rendered sources; an attempt fails if it never
    /// appears.
    fn landmark(&self) -> Option<&str> {
        None
    }

    /// Fixed paginated search-result URL for a term. Pages are 1-based.
    fn search_url(&self, term: &str, page: u32) -> String;

    /// Yields zero or more raw listings from a fetched page.
    fn extract(&self, html: &str) -> Vec<RawListing>;
}

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("hard-coded selector")
}

/// First non-empty text of the first match under `element`, trimmed.
pub(crate) fn select_text(element: ElementRef<'_>, sel: &Selector) -> Option<String> {
    element
        .select(sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Form-encodes a free-text search term for a query string. Spaces become
/// '+'; anything outside the unreserved set is percent-escaped.
pub(crate) fn query_encode(term: &str) -> String {
    let mut encoded = String::with_capacity(term.len());
    for ch in term.trim().chars() {
        match ch {
            ' ' => encoded.push('+'),
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => encoded.push(ch),
            _ => {
                let mut buf = [0u8; 4];
                for byte in ch.encode_utf8(&mut buf).bytes() {
                    encoded.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_encode_joins_words_with_plus() {
        assert_eq!(query_encode("wireless headphones"), "wireless+headphones");
        assert_eq!(query_encode("  usb cable  "), "usb+cable");
    }

    #[test]
    fn query_encode_escapes_reserved_characters() {
        assert_eq!(query_encode("tea & coffee 100%"), "tea+%26+coffee+100%25");
        assert_eq!(query_encode("what? #5"), "what%3F+%235");
    }

    #[test]
    fn query_encode_escapes_multibyte_characters() {
        assert_eq!(query_encode("café"), "caf%C3%A9");
    }
}

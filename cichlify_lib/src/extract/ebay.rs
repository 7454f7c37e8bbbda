//! eBay search-result extraction.
//!
//! eBay serves complete markup over plain HTTP. The result list leads with a
//! promotional "Shop on eBay" row that is not a real listing and is skipped.

use scraper::{Html, Selector};

use super::{query_encode, select_text, selector, FetchMode, RawListing, SourceExtractor};
use crate::types::Source;

const PLACEHOLDER_TITLE: &str = "Shop on eBay";

pub struct EbayExtractor {
    base_url: String,
    item: Selector,
    title: Selector,
    price: Selector,
    shipping: Selector,
    reviews: Selector,
    rating: Selector,
}

impl EbayExtractor {
    pub fn new() -> Self {
        Self::with_base_url("https://www.ebay.com")
    }

    /// Custom base URL, for tests against a local server.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            item: selector("li.s-item"),
            title: selector(".s-item__title"),
            price: selector("span.s-item__price"),
            shipping: selector("span.s-item__shipping"),
            reviews: selector("span.s-item__reviews-count span"),
            rating: selector("div.x-star-rating span.clipped"),
        }
    }
}

impl Default for EbayExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceExtractor for EbayExtractor {
    fn source(&self) -> Source {
        Source::Ebay
    }

    fn fetch_mode(&self) -> FetchMode {
        FetchMode::Static
    }

    fn search_url(&self, term: &str, page: u32) -> String {
        format!(
            "{}/sch/i.html?_nkw={}&_pgn={}",
            self.base_url,
            query_encode(term),
            page
        )
    }

    fn extract(&self, html: &str) -> Vec<RawListing> {
        let doc = Html::parse_document(html);
        let mut listings = Vec::new();
        for item in doc.select(&self.item) {
            let title = select_text(item, &self.title);
            if title.as_deref() == Some(PLACEHOLDER_TITLE) {
                tracing::debug!("skipping promotional result row");
                continue;
            }
            // Review counts render as "144 product ratings"; the leading
            // token is the count.
            let review_count = select_text(item, &self.reviews)
                .and_then(|text| text.split_whitespace().next().map(str::to_string));
            listings.push(RawListing {
                title,
                price: select_text(item, &self.price),
                rating: select_text(item, &self.rating),
                review_count,
                shipping: select_text(item, &self.shipping),
            });
        }
        listings
    }
}

//! Amazon search-result extraction.
//!
//! Amazon renders its result grid client-side, so pages come through the
//! browser session. Prices are split into whole and fraction spans; the two
//! parts are joined with a decimal point here, before normalization.

use scraper::{Html, Selector};

use super::{query_encode, select_text, selector, FetchMode, RawListing, SourceExtractor};
use crate::types::Source;

const RESULT_CARD: &str = "div[data-component-type='s-search-result']";

pub struct AmazonExtractor {
    base_url: String,
    result: Selector,
    title: Selector,
    price_whole: Selector,
    price_fraction: Selector,
    rating: Selector,
    review_count: Selector,
    sponsored: Selector,
}

impl AmazonExtractor {
    pub fn new() -> Self {
        Self::with_base_url("https://www.amazon.com")
    }

    /// Custom base URL, for tests against a local server.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            result: selector(RESULT_CARD),
            title: selector("h2 span"),
            price_whole: selector("span.a-price-whole"),
            price_fraction: selector("span.a-price-fraction"),
            rating: selector("span.a-icon-alt"),
            review_count: selector("span.a-size-base.s-underline-text"),
            sponsored: selector("span.puis-sponsored-label-text"),
        }
    }
}

impl Default for AmazonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceExtractor for AmazonExtractor {
    fn source(&self) -> Source {
        Source::Amazon
    }

    fn fetch_mode(&self) -> FetchMode {
        FetchMode::Rendered
    }

    fn landmark(&self) -> Option<&str> {
        Some(RESULT_CARD)
    }

    fn search_url(&self, term: &str, page: u32) -> String {
        format!("{}/s?k={}&page={}", self.base_url, query_encode(term), page)
    }

    fn extract(&self, html: &str) -> Vec<RawListing> {
        let doc = Html::parse_document(html);
        let mut listings = Vec::new();
        for card in doc.select(&self.result) {
            if card.select(&self.sponsored).next().is_some() {
                tracing::debug!("skipping sponsored result card");
                continue;
            }
            // Whole part often carries a trailing dot ("1,234."); drop it
            // before joining with the fraction.
            let price = match (
                select_text(card, &self.price_whole),
                select_text(card, &self.price_fraction),
            ) {
                (Some(whole), Some(fraction)) => {
                    Some(format!("{}.{}", whole.trim_end_matches('.'), fraction))
                }
                (Some(whole), None) => Some(whole),
                _ => None,
            };
            listings.push(RawListing {
                title: select_text(card, &self.title),
                price,
                rating: select_text(card, &self.rating),
                review_count: select_text(card, &self.review_count),
                shipping: None,
            });
        }
        listings
    }
}

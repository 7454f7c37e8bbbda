//! Scrape session driver: pagination, retrieval, extraction, and record
//! admission.
//!
//! Sources are worked strictly one at a time, and one page at a time within
//! a source; the politeness delay and identity rotation only mean something
//! when requests against a target are serialized.

use crate::browser::BrowserSession;
use crate::extract::{FetchMode, RawListing, SourceExtractor};
use crate::fetch::{FetchError, Fetcher, RetryPolicy};
use crate::normalize::{normalize_count, normalize_price, normalize_rating};
use crate::types::{ProductRecord, Source};

/// Run configuration for one scrape session.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub search_term: String,
    /// Pages fetched per source.
    pub max_pages: u32,
    pub retry: RetryPolicy,
    /// When false, every source is fetched over plain HTTP even if it
    /// declares itself rendered. Also the test path.
    pub use_browser: bool,
}

impl ScrapeConfig {
    pub fn new(search_term: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            max_pages: 2,
            retry: RetryPolicy::default(),
            use_browser: true,
        }
    }
}

/// Drives a full acquisition run across the configured extractors.
pub struct ProductScraper {
    config: ScrapeConfig,
    extractors: Vec<Box<dyn SourceExtractor>>,
    browser: Option<BrowserSession>,
}

impl ProductScraper {
    /// Builds a session, acquiring the browser up front iff any configured
    /// source needs a rendered DOM. A browser launch failure is fatal to the
    /// run and propagates immediately.
    pub fn new(
        config: ScrapeConfig,
        extractors: Vec<Box<dyn SourceExtractor>>,
    ) -> Result<Self, FetchError> {
        let needs_browser = config.use_browser
            && extractors
                .iter()
                .any(|e| e.fetch_mode() == FetchMode::Rendered);
        let browser = if needs_browser {
            Some(BrowserSession::launch()?)
        } else {
            None
        };
        Ok(Self {
            config,
            extractors,
            browser,
        })
    }

    /// Scrapes every configured source sequentially, returning one record
    /// set per source in configuration order.
    pub async fn scrape_all(&self) -> Vec<Vec<ProductRecord>> {
        let mut source_sets = Vec::with_capacity(self.extractors.len());
        for extractor in &self.extractors {
            source_sets.push(self.scrape_source(extractor.as_ref()).await);
        }
        source_sets
    }

    /// Paginates one source, degrading per page: a page whose retries are
    /// exhausted contributes nothing, and the run continues.
    pub async fn scrape_source(&self, extractor: &dyn SourceExtractor) -> Vec<ProductRecord> {
        let source = extractor.source();
        let mut records = Vec::new();
        let mut discarded = 0usize;
        for page in 1..=self.config.max_pages {
            let url = extractor.search_url(&self.config.search_term, page);
            let html = match self.fetch_page(extractor, &url).await {
                Ok(html) => html,
                Err(err) => {
                    tracing::warn!("{} page {} contributed nothing: {}", source, page, err);
                    continue;
                }
            };
            let raw_items = extractor.extract(&html);
            tracing::info!("{} page {}: {} listing units", source, page, raw_items.len());
            for raw in raw_items {
                match admit(raw, source) {
                    Some(record) => records.push(record),
                    None => discarded += 1,
                }
            }
        }
        tracing::info!(
            "{}: kept {} records, discarded {} without a usable price",
            source,
            records.len(),
            discarded
        );
        records
    }

    async fn fetch_page(
        &self,
        extractor: &dyn SourceExtractor,
        url: &str,
    ) -> Result<String, FetchError> {
        let rendered = self.config.use_browser && extractor.fetch_mode() == FetchMode::Rendered;
        if rendered {
            let session = self.browser.as_ref().ok_or_else(|| {
                FetchError::Browser("browser session not initialized".to_string())
            })?;
            let landmark = extractor.landmark().unwrap_or("body");
            Fetcher::fetch_rendered(session, url, landmark, &self.config.retry).await
        } else {
            Fetcher::fetch_static(url, &self.config.retry).await
        }
    }
}

/// Converts raw field text into a typed record. A listing without a positive
/// parseable price is discarded here, before it can enter the dataset; every
/// other field degrades to absent.
fn admit(raw: RawListing, source: Source) -> Option<ProductRecord> {
    let price = match raw.price.as_deref().and_then(normalize_price) {
        Some(price) if price > 0.0 => price,
        _ => {
            tracing::debug!("discarding listing without a positive price: {:?}", raw.title);
            return None;
        }
    };
    Some(ProductRecord {
        title: raw.title.unwrap_or_else(|| "Unknown".to_string()),
        price,
        rating: raw.rating.as_deref().and_then(normalize_rating),
        review_count: raw.review_count.as_deref().and_then(normalize_count),
        shipping: raw.shipping,
        source,
        price_category: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::EbayExtractor;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"
        <ul>
          <li class="s-item">
            <div class="s-item__title">Shop on eBay</div>
          </li>
          <li class="s-item">
            <div class="s-item__title">USB-C Cable 6ft</div>
            <span class="s-item__price">$12.99</span>
            <span class="s-item__shipping">Free shipping</span>
            <span class="s-item__reviews-count"><span>1,204 product ratings</span></span>
            <div class="x-star-rating"><span class="clipped">4.5 out of 5 stars.</span></div>
          </li>
          <li class="s-item">
            <div class="s-item__title">Priceless Curio</div>
          </li>
          <li class="s-item">
            <span class="s-item__price">US $5</span>
          </li>
        </ul>
    "#;

    fn test_config(term: &str) -> ScrapeConfig {
        let mut config = ScrapeConfig::new(term);
        config.max_pages = 1;
        config.retry = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(10),
        };
        config.use_browser = false;
        config
    }

    #[test]
    fn admit_requires_a_positive_price() {
        let raw = RawListing {
            title: Some("Freebie".to_string()),
            price: Some("$0.00".to_string()),
            ..Default::default()
        };
        assert!(admit(raw, Source::Ebay).is_none());

        let raw = RawListing {
            title: Some("No price".to_string()),
            ..Default::default()
        };
        assert!(admit(raw, Source::Ebay).is_none());
    }

    #[test]
    fn admit_defaults_missing_title_to_unknown() {
        let raw = RawListing {
            price: Some("US $5".to_string()),
            ..Default::default()
        };
        let record = admit(raw, Source::Ebay).expect("price is present");
        assert_eq!(record.title, "Unknown");
        assert_eq!(record.price, 5.0);
        assert!(record.rating.is_none());
        assert!(record.price_category.is_none());
    }

    #[tokio::test]
    async fn scrape_source_normalizes_and_discards() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sch/i.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let extractor = EbayExtractor::with_base_url(&server.uri());
        let scraper = ProductScraper::new(test_config("usb cable"), vec![Box::new(extractor)])
            .expect("no browser needed");
        let sets = scraper.scrape_all().await;
        assert_eq!(sets.len(), 1);
        let records = &sets[0];

        // Placeholder and the priceless listing are gone; two priced rows stay.
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "USB-C Cable 6ft");
        assert_eq!(records[0].price, 12.99);
        assert_eq!(records[0].rating, Some(4.5));
        assert_eq!(records[0].review_count, Some(1204));
        assert_eq!(records[0].shipping.as_deref(), Some("Free shipping"));
        assert_eq!(records[1].title, "Unknown");
        assert_eq!(records[1].price, 5.0);
    }

    #[tokio::test]
    async fn failed_page_contributes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let extractor = EbayExtractor::with_base_url(&server.uri());
        let scraper = ProductScraper::new(test_config("anything"), vec![Box::new(extractor)])
            .expect("no browser needed");
        let sets = scraper.scrape_all().await;
        assert_eq!(sets.len(), 1);
        assert!(sets[0].is_empty());
    }
}

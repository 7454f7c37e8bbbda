//! Library layer for Cichlify: multi-source product listing acquisition,
//! normalization, and price analysis.
//!
//! The pipeline runs search-term pagination against each configured
//! marketplace, extracts raw listing text with source-specific structural
//! rules, normalizes it into typed records, and hands the unioned dataset
//! to the analysis layer for deduplication, quartile binning, grouped
//! statistics, and a rank-indexed trend projection.

pub mod analysis;
pub mod browser;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod scrape;
pub mod types;
pub mod user_agent;

pub use analysis::AggregatedDataset;
pub use browser::BrowserSession;
pub use extract::{AmazonExtractor, EbayExtractor, FetchMode, RawListing, SourceExtractor};
pub use fetch::{FetchError, Fetcher, RetryPolicy};
pub use scrape::{ProductScraper, ScrapeConfig};
pub use types::{
    CompetitiveCell, PriceCategory, PricePoint, PricePrediction, PriceStatistics, ProductRecord,
    Source,
};

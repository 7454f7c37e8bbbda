//! Core data model: observed listings and derived aggregates.

use std::fmt;

use serde::Serialize;

/// One external listings provider with its own page structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Source {
    Amazon,
    Ebay,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Amazon => write!(f, "Amazon"),
            Source::Ebay => write!(f, "eBay"),
        }
    }
}

/// Quartile-based price band, recomputed over each run's full dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PriceCategory {
    Budget,
    Economy,
    MidRange,
    Premium,
}

impl fmt::Display for PriceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceCategory::Budget => write!(f, "Budget"),
            PriceCategory::Economy => write!(f, "Economy"),
            PriceCategory::MidRange => write!(f, "Mid-range"),
            PriceCategory::Premium => write!(f, "Premium"),
        }
    }
}

/// One observed listing that survived extraction.
///
/// `price` is always present and positive; admission discards anything else
/// before it reaches the dataset. All other fields are optional and
/// source-dependent. `price_category` is a derived column, unset until the
/// aggregation stage has run quartile binning.
#[derive(Debug, Clone, Serialize)]
pub struct ProductRecord {
    pub title: String,
    pub price: f64,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub shipping: Option<String>,
    pub source: Source,
    pub price_category: Option<PriceCategory>,
}

/// Per-source price summary, recomputed on demand.
#[derive(Debug, Clone, Serialize)]
pub struct PriceStatistics {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; 0.0 for a single record.
    pub std_dev: f64,
    /// max - min.
    pub range: f64,
}

/// One projected (rank, price) pair beyond the observed distribution.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PricePoint {
    pub index: usize,
    pub price: f64,
}

/// Linear trend fit over records ranked by ascending price, projected past
/// the maximum observed rank. The index is a price rank, not a time axis.
#[derive(Debug, Clone, Serialize)]
pub struct PricePrediction {
    pub points: Vec<PricePoint>,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Mean price and record count for one (source, category) cell of the
/// competitive breakdown.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CompetitiveCell {
    pub mean_price: f64,
    pub count: usize,
}

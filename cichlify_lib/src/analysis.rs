//! Aggregation and summary statistics over acquired product records.
//!
//! A pure transformation pipeline, invoked once per run: merge, deduplicate,
//! impute, quartile binning, grouped statistics, and a rank-indexed linear
//! trend projection. Every stage is total over its input; insufficient data
//! downgrades to an absent or degenerate result with a diagnostic.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::types::{
    CompetitiveCell, PriceCategory, PricePoint, PricePrediction, PriceStatistics, ProductRecord,
    Source,
};

/// Minimum records for a trend fit to be worth reporting.
const MIN_PREDICTION_RECORDS: usize = 10;

/// Concatenates per-source record sets in source order.
pub fn merge(source_sets: Vec<Vec<ProductRecord>>) -> Vec<ProductRecord> {
    let mut merged = Vec::new();
    for set in source_sets {
        merged.extend(set);
    }
    merged
}

/// Removes records sharing an identical (title, price) pair, keeping the
/// first occurrence in merge order.
pub fn deduplicate(records: Vec<ProductRecord>) -> Vec<ProductRecord> {
    let mut seen: HashSet<(String, u64)> = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert((record.title.clone(), record.price.to_bits())))
        .collect()
}

/// Defaults absent ratings and review counts to 0.
///
/// Zero here means "no signal", not an observed zero; consumers comparing
/// ratings should treat imputed zeros accordingly.
pub fn impute_missing(records: &mut [ProductRecord]) {
    for record in records.iter_mut() {
        record.rating.get_or_insert(0.0);
        record.review_count.get_or_insert(0);
    }
}

/// Assigns each record a quartile-based price category computed over the full
/// dataset's price distribution. Boundaries are data-dependent and recomputed
/// per run; the four bins are quantile-sized, not equal-price-width.
///
/// Fewer than 4 distinct prices cannot produce non-degenerate bins: the
/// records are left uncategorized and `false` is returned, with a warning.
pub fn categorize(records: &mut [ProductRecord]) -> bool {
    let mut prices: Vec<f64> = records.iter().map(|r| r.price).collect();
    prices.sort_by(f64_cmp);
    let mut distinct = prices.clone();
    distinct.dedup();
    if distinct.len() < 4 {
        tracing::warn!(
            "only {} distinct prices; skipping quartile binning",
            distinct.len()
        );
        return false;
    }

    let q1 = percentile(&prices, 0.25);
    let q2 = percentile(&prices, 0.50);
    let q3 = percentile(&prices, 0.75);
    for record in records.iter_mut() {
        let category = if record.price <= q1 {
            PriceCategory::Budget
        } else if record.price <= q2 {
            PriceCategory::Economy
        } else if record.price <= q3 {
            PriceCategory::MidRange
        } else {
            PriceCategory::Premium
        };
        record.price_category = Some(category);
    }
    true
}

/// Per-source price summary. Sources with no records have no row.
pub fn price_statistics(records: &[ProductRecord]) -> HashMap<Source, PriceStatistics> {
    let mut by_source: HashMap<Source, Vec<f64>> = HashMap::new();
    for record in records {
        by_source.entry(record.source).or_default().push(record.price);
    }
    by_source
        .into_iter()
        .map(|(source, prices)| (source, summarize(prices)))
        .collect()
}

/// Mean price and count per (source, category) cell. Empty when binning has
/// not run.
pub fn competitive_breakdown(
    records: &[ProductRecord],
) -> HashMap<(Source, PriceCategory), CompetitiveCell> {
    let mut cells: HashMap<(Source, PriceCategory), Vec<f64>> = HashMap::new();
    for record in records {
        if let Some(category) = record.price_category {
            cells
                .entry((record.source, category))
                .or_default()
                .push(record.price);
        }
    }
    cells
        .into_iter()
        .map(|(key, prices)| {
            let count = prices.len();
            let mean_price = prices.iter().sum::<f64>() / count as f64;
            (key, CompetitiveCell { mean_price, count })
        })
        .collect()
}

/// Fits an ordinary-least-squares line over records ranked by ascending
/// price and projects `horizon` ranks past the observed maximum.
///
/// The index is a price rank, not a time axis, so the projection describes
/// the tail of the price distribution rather than a forecast. Returns `None`
/// below the minimum-data guard.
pub fn predict_prices(records: &[ProductRecord], horizon: usize) -> Option<PricePrediction> {
    if records.len() < MIN_PREDICTION_RECORDS {
        tracing::warn!(
            "{} records is too few for a trend fit (need {})",
            records.len(),
            MIN_PREDICTION_RECORDS
        );
        return None;
    }

    let mut prices: Vec<f64> = records.iter().map(|r| r.price).collect();
    prices.sort_by(f64_cmp);

    let n = prices.len();
    let mean_x = (n - 1) as f64 / 2.0;
    let mean_y = prices.iter().sum::<f64>() / n as f64;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (i, price) in prices.iter().enumerate() {
        let dx = i as f64 - mean_x;
        sxx += dx * dx;
        sxy += dx * (price - mean_y);
    }
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = mean_y - slope * mean_x;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (i, price) in prices.iter().enumerate() {
        let fitted = intercept + slope * i as f64;
        ss_res += (price - fitted).powi(2);
        ss_tot += (price - mean_y).powi(2);
    }
    let r_squared = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        1.0
    };

    let points = (n..n + horizon)
        .map(|index| PricePoint {
            index,
            price: intercept + slope * index as f64,
        })
        .collect();

    Some(PricePrediction {
        points,
        slope,
        intercept,
        r_squared,
    })
}

/// The unioned, cleaned record sequence for one run.
///
/// Owned exclusively for the duration of the run and rebuilt fully on each
/// invocation; never incrementally updated.
#[derive(Debug, Serialize)]
pub struct AggregatedDataset {
    records: Vec<ProductRecord>,
    categorized: bool,
}

impl AggregatedDataset {
    /// Runs merge -> deduplicate -> impute -> categorize over the per-source
    /// record sets.
    pub fn build(source_sets: Vec<Vec<ProductRecord>>) -> Self {
        let merged = merge(source_sets);
        let mut records = deduplicate(merged);
        impute_missing(&mut records);
        let categorized = categorize(&mut records);
        tracing::info!(
            "aggregated {} unique records (categorized: {})",
            records.len(),
            categorized
        );
        Self {
            records,
            categorized,
        }
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    /// Whether quartile binning produced categories this run.
    pub fn is_categorized(&self) -> bool {
        self.categorized
    }

    pub fn price_statistics(&self) -> HashMap<Source, PriceStatistics> {
        price_statistics(&self.records)
    }

    pub fn competitive_breakdown(&self) -> HashMap<(Source, PriceCategory), CompetitiveCell> {
        competitive_breakdown(&self.records)
    }

    pub fn predict_prices(&self, horizon: usize) -> Option<PricePrediction> {
        predict_prices(&self.records, horizon)
    }
}

fn f64_cmp(a: &f64, b: &f64) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Linear-interpolated percentile of a sorted, non-empty slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn summarize(mut prices: Vec<f64>) -> PriceStatistics {
    prices.sort_by(f64_cmp);
    let count = prices.len();
    let min = prices[0];
    let max = prices[count - 1];
    let mean = prices.iter().sum::<f64>() / count as f64;
    let median = if count % 2 == 0 {
        (prices[count / 2 - 1] + prices[count / 2]) / 2.0
    } else {
        prices[count / 2]
    };
    let std_dev = if count > 1 {
        (prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / (count - 1) as f64).sqrt()
    } else {
        0.0
    };
    PriceStatistics {
        count,
        min,
        max,
        mean,
        median,
        std_dev,
        range: max - min,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, price: f64, source: Source) -> ProductRecord {
        ProductRecord {
            title: title.to_string(),
            price,
            rating: None,
            review_count: None,
            shipping: None,
            source,
            price_category: None,
        }
    }

    #[test]
    fn deduplicate_removes_identical_title_price_pairs() {
        let records = vec![
            record("A", 10.0, Source::Amazon),
            record("A", 10.0, Source::Ebay),
            record("A", 12.0, Source::Ebay),
            record("B", 10.0, Source::Amazon),
        ];
        let unique = deduplicate(records);
        assert_eq!(unique.len(), 3);
        // First occurrence wins.
        assert_eq!(unique[0].source, Source::Amazon);
        let mut pairs: Vec<(String, u64)> = unique
            .iter()
            .map(|r| (r.title.clone(), r.price.to_bits()))
            .collect();
        let before = pairs.len();
        pairs.dedup();
        assert_eq!(pairs.len(), before);
    }

    #[test]
    fn impute_defaults_absent_signals_to_zero() {
        let mut records = vec![record("A", 10.0, Source::Amazon)];
        records[0].rating = Some(4.5);
        records.push(record("B", 20.0, Source::Ebay));
        impute_missing(&mut records);
        assert_eq!(records[0].rating, Some(4.5));
        assert_eq!(records[0].review_count, Some(0));
        assert_eq!(records[1].rating, Some(0.0));
        assert_eq!(records[1].review_count, Some(0));
    }

    #[test]
    fn categorize_partitions_into_quartile_sized_bins() {
        let mut records: Vec<ProductRecord> = (1..=10)
            .map(|i| record(&format!("P{i}"), (i * 10) as f64, Source::Amazon))
            .collect();
        assert!(categorize(&mut records));

        let mut counts: HashMap<PriceCategory, usize> = HashMap::new();
        for r in &records {
            *counts.entry(r.price_category.unwrap()).or_default() += 1;
        }
        assert_eq!(counts.len(), 4, "all four categories populated");
        for (category, count) in &counts {
            assert!(
                (2..=3).contains(count),
                "{category} holds {count} of 10 records, not ~25%"
            );
        }
        // Cheapest record is Budget, dearest is Premium.
        assert_eq!(records[0].price_category, Some(PriceCategory::Budget));
        assert_eq!(records[9].price_category, Some(PriceCategory::Premium));
    }

    #[test]
    fn categorize_reports_degenerate_input() {
        let mut records = vec![
            record("A", 5.0, Source::Amazon),
            record("B", 5.0, Source::Amazon),
            record("C", 7.0, Source::Ebay),
            record("D", 9.0, Source::Ebay),
        ];
        assert!(!categorize(&mut records));
        assert!(records.iter().all(|r| r.price_category.is_none()));
    }

    #[test]
    fn statistics_invariants_hold_per_source() {
        let records = vec![
            record("A", 10.0, Source::Amazon),
            record("B", 30.0, Source::Amazon),
            record("C", 20.0, Source::Amazon),
            record("D", 99.0, Source::Ebay),
        ];
        let stats = price_statistics(&records);
        assert_eq!(stats.len(), 2);
        for s in stats.values() {
            assert!(s.min <= s.mean && s.mean <= s.max);
            assert!((s.range - (s.max - s.min)).abs() < f64::EPSILON);
        }
        let amazon = &stats[&Source::Amazon];
        assert_eq!(amazon.count, 3);
        assert_eq!(amazon.median, 20.0);
        assert_eq!(amazon.mean, 20.0);
        assert_eq!(amazon.std_dev, 10.0);
        let ebay = &stats[&Source::Ebay];
        assert_eq!(ebay.count, 1);
        assert_eq!(ebay.std_dev, 0.0);
    }

    #[test]
    fn breakdown_is_empty_before_binning() {
        let records = vec![record("A", 10.0, Source::Amazon)];
        assert!(competitive_breakdown(&records).is_empty());
    }

    #[test]
    fn breakdown_groups_by_source_and_category() {
        let mut records: Vec<ProductRecord> = (1..=8)
            .map(|i| {
                let source = if i % 2 == 0 { Source::Ebay } else { Source::Amazon };
                record(&format!("P{i}"), (i * 10) as f64, source)
            })
            .collect();
        assert!(categorize(&mut records));
        let breakdown = competitive_breakdown(&records);
        let total: usize = breakdown.values().map(|c| c.count).sum();
        assert_eq!(total, 8);
        for ((_, _), cell) in &breakdown {
            assert!(cell.mean_price > 0.0);
            assert!(cell.count > 0);
        }
    }

    #[test]
    fn prediction_requires_minimum_records() {
        let records: Vec<ProductRecord> = (1..=9)
            .map(|i| record(&format!("P{i}"), i as f64, Source::Amazon))
            .collect();
        assert!(predict_prices(&records, 5).is_none());
    }

    #[test]
    fn prediction_fits_a_linear_price_sequence() {
        let records: Vec<ProductRecord> = (1..=20)
            .map(|i| record(&format!("P{i}"), i as f64, Source::Amazon))
            .collect();
        let prediction = predict_prices(&records, 5).expect("enough records");
        assert!(prediction.r_squared > 0.99);
        assert!((prediction.slope - 1.0).abs() < 1e-9);
        assert_eq!(prediction.points.len(), 5);
        // Ranks 0..19 carry prices 1..20, so rank 20 projects to 21.
        assert_eq!(prediction.points[0].index, 20);
        assert!((prediction.points[0].price - 21.0).abs() < 1e-9);
    }

    #[test]
    fn prediction_orders_by_price_not_arrival() {
        let mut records: Vec<ProductRecord> = (1..=20)
            .map(|i| record(&format!("P{i}"), i as f64, Source::Amazon))
            .collect();
        records.reverse();
        let prediction = predict_prices(&records, 1).expect("enough records");
        assert!(prediction.slope > 0.0, "rank ordering is by ascending price");
    }

    #[test]
    fn end_to_end_aggregation_of_two_sources() {
        // 15 records per source, 5 of eBay's duplicating Amazon (title, price).
        let amazon: Vec<ProductRecord> = (1..=15)
            .map(|i| record(&format!("Item {i}"), (i * 10) as f64, Source::Amazon))
            .collect();
        let mut ebay: Vec<ProductRecord> = (1..=10)
            .map(|i| record(&format!("eBay Item {i}"), (i * 10 + 155) as f64, Source::Ebay))
            .collect();
        for i in 1..=5 {
            ebay.push(record(&format!("Item {i}"), (i * 10) as f64, Source::Ebay));
        }
        assert_eq!(amazon.len() + ebay.len(), 30);

        let dataset = AggregatedDataset::build(vec![amazon, ebay]);
        assert_eq!(dataset.records().len(), 25);
        assert!(dataset.is_categorized());

        let mut categories: HashSet<PriceCategory> = HashSet::new();
        for r in dataset.records() {
            categories.insert(r.price_category.expect("binning ran"));
            assert!(r.rating.is_some() && r.review_count.is_some(), "imputed");
        }
        assert_eq!(categories.len(), 4);

        let stats = dataset.price_statistics();
        assert!(stats.contains_key(&Source::Amazon));
        assert!(stats.contains_key(&Source::Ebay));

        assert!(dataset.predict_prices(5).is_some());
    }
}

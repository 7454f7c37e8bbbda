//! Table and JSON rendering for analysis results.

use anyhow::Result;
use cichlify_lib::{AggregatedDataset, PriceCategory, PricePrediction, Source};
use serde::Serialize;
use tabled::{Table, Tabled};

pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Tabled, Serialize)]
struct StatsRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Max")]
    max: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Median")]
    median: String,
    #[tabled(rename = "Std Dev")]
    std_dev: String,
    #[tabled(rename = "Range")]
    range: String,
}

#[derive(Tabled, Serialize)]
struct BreakdownRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Mean Price")]
    mean_price: String,
    #[tabled(rename = "Count")]
    count: usize,
}

#[derive(Tabled, Serialize)]
struct PredictionRow {
    #[tabled(rename = "Rank")]
    index: usize,
    #[tabled(rename = "Projected Price")]
    price: String,
}

#[derive(Serialize)]
struct PredictionReport {
    r_squared: f64,
    slope: f64,
    points: Vec<PredictionRow>,
}

#[derive(Serialize)]
struct Report<'a> {
    unique_records: usize,
    categorized: bool,
    statistics: Vec<StatsRow>,
    breakdown: Vec<BreakdownRow>,
    prediction: Option<PredictionReport>,
    records: &'a [cichlify_lib::ProductRecord],
}

pub fn print_report(
    dataset: &AggregatedDataset,
    horizon: usize,
    format: &OutputFormat,
) -> Result<()> {
    let statistics = stats_rows(dataset);
    let breakdown = breakdown_rows(dataset);
    let prediction = dataset.predict_prices(horizon).map(prediction_report);

    match format {
        OutputFormat::Json => {
            let report = Report {
                unique_records: dataset.records().len(),
                categorized: dataset.is_categorized(),
                statistics,
                breakdown,
                prediction,
                records: dataset.records(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            println!("{} unique records", dataset.records().len());

            println!("\nPrice statistics");
            println!("{}", Table::new(&statistics));

            if breakdown.is_empty() {
                println!("\nCompetitive breakdown: unavailable (too few distinct prices)");
            } else {
                println!("\nCompetitive breakdown");
                println!("{}", Table::new(&breakdown));
            }

            match prediction {
                Some(report) => {
                    println!(
                        "\nPrice projection (rank-extrapolated, R² = {:.4})",
                        report.r_squared
                    );
                    println!("{}", Table::new(&report.points));
                }
                None => println!("\nPrice projection: unavailable (too few records)"),
            }
        }
    }
    Ok(())
}

fn stats_rows(dataset: &AggregatedDataset) -> Vec<StatsRow> {
    let mut stats: Vec<(Source, _)> = dataset.price_statistics().into_iter().collect();
    stats.sort_by_key(|(source, _)| *source);
    stats
        .into_iter()
        .map(|(source, s)| StatsRow {
            source: source.to_string(),
            count: s.count,
            min: format!("{:.2}", s.min),
            max: format!("{:.2}", s.max),
            mean: format!("{:.2}", s.mean),
            median: format!("{:.2}", s.median),
            std_dev: format!("{:.2}", s.std_dev),
            range: format!("{:.2}", s.range),
        })
        .collect()
}

fn breakdown_rows(dataset: &AggregatedDataset) -> Vec<BreakdownRow> {
    let mut cells: Vec<((Source, PriceCategory), _)> =
        dataset.competitive_breakdown().into_iter().collect();
    cells.sort_by_key(|(key, _)| *key);
    cells
        .into_iter()
        .map(|((source, category), cell)| BreakdownRow {
            source: source.to_string(),
            category: category.to_string(),
            mean_price: format!("{:.2}", cell.mean_price),
            count: cell.count,
        })
        .collect()
}

fn prediction_report(prediction: PricePrediction) -> PredictionReport {
    PredictionReport {
        r_squared: prediction.r_squared,
        slope: prediction.slope,
        points: prediction
            .points
            .iter()
            .map(|p| PredictionRow {
                index: p.index,
                price: format!("{:.2}", p.price),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cichlify_lib::ProductRecord;

    fn dataset() -> AggregatedDataset {
        let records: Vec<ProductRecord> = (1..=12)
            .map(|i| ProductRecord {
                title: format!("Item {i}"),
                price: (i * 5) as f64,
                rating: None,
                review_count: None,
                shipping: None,
                source: if i % 2 == 0 { Source::Ebay } else { Source::Amazon },
                price_category: None,
            })
            .collect();
        AggregatedDataset::build(vec![records])
    }

    #[test]
    fn stats_rows_are_sorted_by_source() {
        let rows = stats_rows(&dataset());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].source, "Amazon");
        assert_eq!(rows[1].source, "eBay");
    }

    #[test]
    fn breakdown_rows_cover_all_records() {
        let rows = breakdown_rows(&dataset());
        let total: usize = rows.iter().map(|r| r.count).sum();
        assert_eq!(total, 12);
    }

    #[test]
    fn report_serializes_to_json() {
        let ds = dataset();
        let report = Report {
            unique_records: ds.records().len(),
            categorized: ds.is_categorized(),
            statistics: stats_rows(&ds),
            breakdown: breakdown_rows(&ds),
            prediction: ds.predict_prices(3).map(prediction_report),
            records: ds.records(),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"unique_records\":12"));
        assert!(json.contains("\"prediction\""));
    }
}

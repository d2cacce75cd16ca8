//! CSV ingestion and re-export, plus the built-in demo batch.
//!
//! Ingestion is tolerant: headers are trimmed, blank lines skipped, and
//! ragged rows accepted (short rows get empty cells for their missing
//! trailing columns, so every parsed row carries the full header set). Only
//! a structural failure aborts the batch.
//!
//! Export intentionally reproduces the legacy format: every value wrapped in
//! double quotes with no further escaping. Do not "fix" this without also
//! changing the downstream tooling that consumes it.

use crate::errors::{AppError, AppResult};
use crate::models::{CellValue, RawRecord, SqprRecord, KNOWN_COLUMNS};
use std::collections::BTreeSet;

pub fn parse_csv_text(text: &str) -> AppResult<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|error| AppError::Parse(format!("CSV parsing error: {error}")))?
        .iter()
        .map(|header| header.to_string())
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|error| AppError::Parse(format!("CSV parsing error: {error}")))?;
        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let mut record = RawRecord::new();
        for (index, header) in headers.iter().enumerate() {
            let field = row.get(index).unwrap_or_default();
            record.insert(header.clone(), CellValue::Text(field.to_string()));
        }
        records.push(record);
    }
    Ok(records)
}

/// The column list for export: the fixed vocabulary first, then any
/// passthrough columns seen in the batch.
pub fn export_columns(records: &[SqprRecord]) -> Vec<String> {
    let mut columns: Vec<String> = KNOWN_COLUMNS.iter().map(|c| c.to_string()).collect();
    let extras: BTreeSet<&String> = records.iter().flat_map(|row| row.extra.keys()).collect();
    columns.extend(extras.into_iter().cloned());
    columns
}

/// Regenerate CSV text: comma-joined header row, then each value quoted
/// as-is (absent cells become empty strings).
pub fn export_csv(records: &[SqprRecord]) -> String {
    let columns = export_columns(records);
    let mut lines = vec![columns.join(",")];
    for record in records {
        let raw = record.to_raw();
        let line = columns
            .iter()
            .map(|column| {
                let value = raw.get(column).map(CellValue::as_display).unwrap_or_default();
                format!("\"{value}\"")
            })
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }
    lines.join("\n")
}

/// Three demo rows for exploring the dashboard without a report export.
pub fn sample_batch() -> Vec<RawRecord> {
    let rows: [(&str, f64, f64, f64, f64, f64, f64, f64, f64, f64, f64, f64, f64, f64); 3] = [
        ("wireless headphones", 85.0, 15_420.0, 8.5, 892.0, 5.8, 12.3, 156.0, 17.5, 9.8, 87.0, 55.8, 14.2, 79.99),
        ("bluetooth speaker", 72.0, 9_850.0, 15.2, 445.0, 4.5, 18.7, 89.0, 20.0, 16.4, 32.0, 35.9, 12.8, 49.99),
        ("phone case", 91.0, 25_600.0, 5.4, 1_280.0, 5.0, 7.8, 320.0, 25.0, 8.9, 198.0, 61.9, 11.2, 24.99),
    ];

    rows.iter()
        .map(|(query, score, impressions, impression_share, clicks, click_rate, click_share, basket_adds, basket_add_rate, basket_add_share, purchases, purchase_rate, purchase_share, median_price)| {
            let mut record = RawRecord::new();
            record.insert("Search Query".into(), CellValue::Text(query.to_string()));
            record.insert("Search Query Score".into(), CellValue::Number(*score));
            record.insert("Impressions: Total Count".into(), CellValue::Number(*impressions));
            record.insert("Impressions: ASIN Share %".into(), CellValue::Number(*impression_share));
            record.insert("Clicks: Total Count".into(), CellValue::Number(*clicks));
            record.insert("Clicks: Click Rate %".into(), CellValue::Number(*click_rate));
            record.insert("Clicks: ASIN Share %".into(), CellValue::Number(*click_share));
            record.insert("Basket Adds: Total Count".into(), CellValue::Number(*basket_adds));
            record.insert("Basket Adds: Basket Add Rate %".into(), CellValue::Number(*basket_add_rate));
            record.insert("Basket Adds: ASIN Share %".into(), CellValue::Number(*basket_add_share));
            record.insert("Purchases: Total Count".into(), CellValue::Number(*purchases));
            record.insert("Purchases: Purchase Rate %".into(), CellValue::Number(*purchase_rate));
            record.insert("Purchases: ASIN Share %".into(), CellValue::Number(*purchase_share));
            record.insert("Clicks: Price (Median)".into(), CellValue::Number(*median_price));
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{COL_CLICKS, COL_IMPRESSIONS, COL_SEARCH_QUERY};
    use crate::normalize::{normalize, validate_batch};

    #[test]
    fn parses_headers_and_rows() {
        let text = "Search Query, Impressions: Total Count ,Clicks: Total Count\nlamp,100,10\n\nmug,200,20\n";
        let records = parse_csv_text(text).expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].get(COL_SEARCH_QUERY),
            Some(&CellValue::Text("lamp".to_string()))
        );
        // Header whitespace is trimmed away.
        assert_eq!(
            records[1].get(COL_IMPRESSIONS),
            Some(&CellValue::Text("200".to_string()))
        );
    }

    #[test]
    fn short_rows_are_padded_with_empty_cells() {
        let text = "Search Query,Impressions: Total Count,Clicks: Total Count\nlamp,100\n";
        let records = parse_csv_text(text).expect("parse");
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].get(COL_CLICKS),
            Some(&CellValue::Text(String::new()))
        );
    }

    #[test]
    fn short_first_row_still_passes_column_validation() {
        // The header row defines the columns; a ragged first data row must
        // not make required columns look missing.
        let text = "Search Query,Impressions: Total Count,Clicks: Total Count,Basket Adds: Total Count,Purchases: Total Count\nlamp,100,10,4\nmug,200,20,8,5\n";
        let records = parse_csv_text(text).expect("parse");
        validate_batch(&records).expect("all required columns present");
        let normalized = normalize(&records);
        assert_eq!(normalized[0].purchases, 0.0);
        assert_eq!(normalized[1].purchases, 5.0);
    }

    #[test]
    fn sample_batch_passes_validation() {
        let records = sample_batch();
        validate_batch(&records).expect("sample batch is valid");
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn export_wraps_every_value_in_quotes() {
        let normalized = normalize(&sample_batch());
        let exported = export_csv(&normalized);
        let mut lines = exported.lines();
        let header = lines.next().expect("header row");
        assert!(header.starts_with("Search Query,Search Query Score,"));
        assert!(header.ends_with("Clicks: Price (Median)"));
        let first = lines.next().expect("first row");
        assert!(first.starts_with("\"wireless headphones\",\"85\","));
        assert!(first.contains("\"15420\""));
        assert!(first.ends_with("\"79.99\""));
    }

    #[test]
    fn export_then_parse_round_trips_after_normalization() {
        // Start from parsed CSV so passthrough cells are text on both sides.
        let text = export_csv(&normalize(&sample_batch()));
        let original = normalize(&parse_csv_text(&text).expect("first parse"));
        let reparsed = parse_csv_text(&export_csv(&original)).expect("reparse");
        assert_eq!(original, normalize(&reparsed));
    }
}

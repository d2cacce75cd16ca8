//! Batch validation and metric normalization.
//!
//! Validation is wholesale: a batch missing any required column is rejected
//! before a single row is touched. Normalization, by contrast, never rejects
//! a row; unparseable cells degrade to 0.

use crate::errors::{AppError, AppResult};
use crate::models::{
    CellValue, RawRecord, SqprRecord, COL_BASKET_ADDS, COL_BASKET_ADD_RATE, COL_BASKET_ADD_SHARE,
    COL_CLICKS, COL_CLICK_RATE, COL_CLICK_SHARE, COL_IMPRESSIONS, COL_IMPRESSION_SHARE,
    COL_PURCHASES, COL_PURCHASE_RATE, COL_PURCHASE_SHARE, COL_SEARCH_QUERY,
    COL_SEARCH_QUERY_SCORE, KNOWN_COLUMNS, REQUIRED_COLUMNS,
};
use crate::numeric::{safe_percentage, to_number};

/// Reject a batch that is empty or missing required columns. The error
/// message enumerates every missing column, not just the first.
pub fn validate_batch(records: &[RawRecord]) -> AppResult<()> {
    let Some(first) = records.first() else {
        return Err(AppError::Validation(
            "batch appears to be empty or could not be parsed".to_string(),
        ));
    };
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !first.contains_key(*column))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Missing required columns: {}. Please ensure your batch contains all required fields.",
            missing.join(", ")
        )))
    }
}

/// Normalize a batch: order-preserving, one output row per input row, never
/// fails.
pub fn normalize(records: &[RawRecord]) -> Vec<SqprRecord> {
    records.iter().map(normalize_record).collect()
}

/// Coerce the known numeric columns and fill in any rate that coerces to
/// zero from the adjacent funnel counts. A genuinely reported 0% rate is
/// indistinguishable from a missing one and gets recomputed; that matches
/// the report tooling this feeds from.
pub fn normalize_record(raw: &RawRecord) -> SqprRecord {
    let impressions = to_number(raw.get(COL_IMPRESSIONS));
    let clicks = to_number(raw.get(COL_CLICKS));
    let basket_adds = to_number(raw.get(COL_BASKET_ADDS));
    let purchases = to_number(raw.get(COL_PURCHASES));

    let click_rate = rate_or_derived(raw.get(COL_CLICK_RATE), clicks, impressions);
    let basket_add_rate = rate_or_derived(raw.get(COL_BASKET_ADD_RATE), basket_adds, clicks);
    let purchase_rate = rate_or_derived(raw.get(COL_PURCHASE_RATE), purchases, basket_adds);

    let search_query = match raw.get(COL_SEARCH_QUERY) {
        Some(CellValue::Text(text)) => text.clone(),
        Some(CellValue::Number(value)) => crate::models::format_cell_number(*value),
        None => String::new(),
    };

    let extra = raw
        .iter()
        .filter(|(column, _)| !KNOWN_COLUMNS.contains(&column.as_str()))
        .map(|(column, cell)| (column.clone(), cell.clone()))
        .collect();

    SqprRecord {
        search_query,
        search_query_score: to_number(raw.get(COL_SEARCH_QUERY_SCORE)),
        impressions,
        impression_share: to_number(raw.get(COL_IMPRESSION_SHARE)),
        clicks,
        click_rate,
        click_share: to_number(raw.get(COL_CLICK_SHARE)),
        basket_adds,
        basket_add_rate,
        basket_add_share: to_number(raw.get(COL_BASKET_ADD_SHARE)),
        purchases,
        purchase_rate,
        purchase_share: to_number(raw.get(COL_PURCHASE_SHARE)),
        extra,
    }
}

fn rate_or_derived(reported: Option<&CellValue>, numerator: f64, denominator: f64) -> f64 {
    let coerced = to_number(reported);
    if coerced != 0.0 && coerced.is_finite() {
        coerced
    } else {
        safe_percentage(numerator, denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;
    use std::collections::BTreeMap;

    fn raw_row(query: &str, impressions: f64, clicks: f64, basket_adds: f64, purchases: f64) -> RawRecord {
        let mut row = BTreeMap::new();
        row.insert(COL_SEARCH_QUERY.to_string(), CellValue::Text(query.to_string()));
        row.insert(COL_IMPRESSIONS.to_string(), CellValue::Number(impressions));
        row.insert(COL_CLICKS.to_string(), CellValue::Number(clicks));
        row.insert(COL_BASKET_ADDS.to_string(), CellValue::Number(basket_adds));
        row.insert(COL_PURCHASES.to_string(), CellValue::Number(purchases));
        row
    }

    #[test]
    fn validation_lists_every_missing_column() {
        let mut row = RawRecord::new();
        row.insert(COL_SEARCH_QUERY.to_string(), CellValue::Text("x".to_string()));
        row.insert(COL_IMPRESSIONS.to_string(), CellValue::Number(1.0));
        let err = validate_batch(&[row]).expect_err("missing columns");
        let message = err.to_string();
        assert!(message.contains(COL_CLICKS));
        assert!(message.contains(COL_BASKET_ADDS));
        assert!(message.contains(COL_PURCHASES));
        assert!(!message.contains("Search Query,"));
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = validate_batch(&[]).expect_err("empty batch");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn missing_rates_are_derived_from_counts() {
        let rows = normalize(&[raw_row("lamp", 1000.0, 100.0, 20.0, 5.0)]);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.click_rate, 10.0);
        assert_eq!(row.basket_add_rate, 20.0);
        assert_eq!(row.purchase_rate, 25.0);
    }

    #[test]
    fn reported_nonzero_rates_win_over_derived() {
        let mut raw = raw_row("lamp", 1000.0, 100.0, 20.0, 5.0);
        raw.insert(COL_CLICK_RATE.to_string(), CellValue::Text("7.5".to_string()));
        let row = normalize_record(&raw);
        assert_eq!(row.click_rate, 7.5);
    }

    #[test]
    fn string_counts_are_coerced() {
        let mut raw = RawRecord::new();
        raw.insert(COL_SEARCH_QUERY.to_string(), CellValue::Text("desk".to_string()));
        raw.insert(COL_IMPRESSIONS.to_string(), CellValue::Text("200".to_string()));
        raw.insert(COL_CLICKS.to_string(), CellValue::Text("nope".to_string()));
        raw.insert(COL_BASKET_ADDS.to_string(), CellValue::Text("".to_string()));
        raw.insert(COL_PURCHASES.to_string(), CellValue::Text("4".to_string()));
        let row = normalize_record(&raw);
        assert_eq!(row.impressions, 200.0);
        assert_eq!(row.clicks, 0.0);
        assert_eq!(row.basket_adds, 0.0);
        assert_eq!(row.purchases, 4.0);
        // Division by the zeroed counts stays guarded.
        assert_eq!(row.click_rate, 0.0);
        assert_eq!(row.purchase_rate, 0.0);
    }

    #[test]
    fn unknown_columns_pass_through() {
        let mut raw = raw_row("lamp", 10.0, 1.0, 1.0, 1.0);
        raw.insert("Reporting Date".to_string(), CellValue::Text("2024-08-01".to_string()));
        let row = normalize_record(&raw);
        assert_eq!(
            row.extra.get("Reporting Date"),
            Some(&CellValue::Text("2024-08-01".to_string()))
        );
    }

    #[test]
    fn normalization_is_idempotent_once_rates_exist() {
        let first = normalize(&[raw_row("lamp", 1000.0, 100.0, 20.0, 5.0)]);
        let raws: Vec<RawRecord> = first.iter().map(|row| row.to_raw()).collect();
        let second = normalize(&raws);
        assert_eq!(first, second);
    }
}

//! Aggregate KPI cards: per-stage totals plus the average ASIN share across
//! the batch.

use crate::funnel::{totals, STAGE_NAMES};
use crate::models::{OverviewMetrics, SqprRecord, StageMetric};
use crate::numeric::{format_compact, safe_divide};

pub fn overview(records: &[SqprRecord]) -> OverviewMetrics {
    let sums = totals(records);
    let row_count = records.len().max(1) as f64;

    let metric = |name: &str, total: f64, share_sum: f64| StageMetric {
        name: name.to_string(),
        total,
        average_share: safe_divide(share_sum, row_count),
        formatted_total: format_compact(total),
    };

    OverviewMetrics {
        metrics: vec![
            metric(STAGE_NAMES[0], sums.impressions, sums.impression_share),
            metric(STAGE_NAMES[1], sums.clicks, sums.click_share),
            metric(STAGE_NAMES[2], sums.basket_adds, sums.basket_add_share),
            metric(STAGE_NAMES[3], sums.purchases, sums.purchase_share),
        ],
        row_count: records.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SqprRecord;
    use std::collections::BTreeMap;

    fn row(impressions: f64, impression_share: f64) -> SqprRecord {
        SqprRecord {
            search_query: "q".to_string(),
            search_query_score: 0.0,
            impressions,
            impression_share,
            clicks: 0.0,
            click_rate: 0.0,
            click_share: 0.0,
            basket_adds: 0.0,
            basket_add_rate: 0.0,
            basket_add_share: 0.0,
            purchases: 0.0,
            purchase_rate: 0.0,
            purchase_share: 0.0,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn totals_and_average_shares() {
        let records = vec![row(12_000.0, 10.0), row(8_000.0, 30.0)];
        let metrics = overview(&records);
        assert_eq!(metrics.metrics[0].name, "Impressions");
        assert_eq!(metrics.metrics[0].total, 20_000.0);
        assert_eq!(metrics.metrics[0].average_share, 20.0);
        assert_eq!(metrics.metrics[0].formatted_total, "20.0K");
        assert_eq!(metrics.row_count, 2);
    }

    #[test]
    fn empty_batch_produces_zeroed_cards() {
        let metrics = overview(&[]);
        assert_eq!(metrics.metrics.len(), 4);
        assert!(metrics.metrics.iter().all(|m| m.total == 0.0 && m.average_share == 0.0));
        assert_eq!(metrics.row_count, 0);
    }
}

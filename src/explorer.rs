//! The query explorer: substring filter, stable sort, pagination, and the
//! per-row display classifications (query type and performance score).

use crate::models::{
    ColumnKey, ExplorerInsights, ExplorerRequest, ExplorerResponse, ExplorerRow, QueryType,
    SortOrder, SqprRecord,
};
use crate::numeric::safe_percentage;
use crate::opportunities::{page, total_pages};
use std::cmp::Ordering;

enum SortValue<'a> {
    Number(f64),
    Text(&'a str),
}

fn sort_value<'a>(record: &'a SqprRecord, key: ColumnKey) -> SortValue<'a> {
    match key {
        ColumnKey::SearchQuery => SortValue::Text(&record.search_query),
        ColumnKey::SearchQueryScore => SortValue::Number(record.search_query_score),
        ColumnKey::Impressions => SortValue::Number(record.impressions),
        ColumnKey::ImpressionShare => SortValue::Number(record.impression_share),
        ColumnKey::Clicks => SortValue::Number(record.clicks),
        ColumnKey::ClickRate => SortValue::Number(record.click_rate),
        ColumnKey::ClickShare => SortValue::Number(record.click_share),
        ColumnKey::BasketAdds => SortValue::Number(record.basket_adds),
        ColumnKey::BasketAddRate => SortValue::Number(record.basket_add_rate),
        ColumnKey::BasketAddShare => SortValue::Number(record.basket_add_share),
        ColumnKey::Purchases => SortValue::Number(record.purchases),
        ColumnKey::PurchaseRate => SortValue::Number(record.purchase_rate),
        ColumnKey::PurchaseShare => SortValue::Number(record.purchase_share),
    }
}

fn compare(a: &SqprRecord, b: &SqprRecord, key: ColumnKey, order: SortOrder) -> Ordering {
    let ordering = match (sort_value(a, key), sort_value(b, key)) {
        (SortValue::Number(x), SortValue::Number(y)) => x.total_cmp(&y),
        (SortValue::Text(x), SortValue::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        // Unreachable with a typed schema; kept as a total ordering anyway.
        (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
        (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
    };
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

/// Filter, sort, and paginate the batch. Total pages are computed over the
/// filtered list, and the sort is stable so equal keys keep input order.
pub fn explore(records: &[SqprRecord], request: &ExplorerRequest) -> ExplorerResponse {
    // A blank term is a no-op filter, but a non-blank term matches verbatim:
    // surrounding whitespace in the term is significant.
    let needle = request.search_term.to_lowercase();
    let filter_active = !request.search_term.trim().is_empty();
    let mut filtered: Vec<&SqprRecord> = records
        .iter()
        .filter(|row| !filter_active || row.search_query.to_lowercase().contains(&needle))
        .collect();
    filtered.sort_by(|a, b| compare(a, b, request.sort_by, request.sort_order));

    let total_rows = filtered.len();
    let rows = page(&filtered, request.page, request.page_size)
        .into_iter()
        .map(|record| classify(record))
        .collect();

    ExplorerResponse {
        rows,
        total_rows,
        total_pages: total_pages(total_rows, request.page_size),
    }
}

fn classify(record: &SqprRecord) -> ExplorerRow {
    ExplorerRow {
        record: record.clone(),
        query_type: query_type(record),
        performance_score: performance_score(record),
    }
}

/// Volume and rate thresholds for the display badge.
pub fn query_type(record: &SqprRecord) -> QueryType {
    if record.impressions > 50_000.0 && record.click_rate > 3.0 {
        QueryType::RisingStar
    } else if record.click_rate > 2.0 && record.basket_add_rate > 3.0 {
        QueryType::StablePerformer
    } else if record.click_rate < 1.0 || record.basket_add_rate < 1.0 {
        QueryType::NeedsAttention
    } else {
        QueryType::StablePerformer
    }
}

/// Weighted health score: CTR 30%, basket-add rate 25%, purchase rate 25%,
/// impression share 20%, clamped to 0..=100.
pub fn performance_score(record: &SqprRecord) -> f64 {
    let score = record.click_rate * 0.30
        + record.basket_add_rate * 0.25
        + record.purchase_rate * 0.25
        + record.impression_share * 0.20;
    score.clamp(0.0, 100.0)
}

/// The three callout lists shown above the table, three rows each.
pub fn insights(records: &[SqprRecord]) -> ExplorerInsights {
    let mut by_volume: Vec<&SqprRecord> = records.iter().collect();
    by_volume.sort_by(|a, b| b.impressions.total_cmp(&a.impressions));
    let top_performers = by_volume.iter().take(3).map(|r| (*r).clone()).collect();

    let hidden_gems = records
        .iter()
        .filter(|row| {
            let conversion = safe_percentage(row.purchases, row.clicks);
            row.impressions < 50_000.0 && row.click_rate > 3.0 && conversion > 10.0
        })
        .take(3)
        .cloned()
        .collect();

    let biggest_drop_offs = records
        .iter()
        .filter(|row| row.click_rate > 2.0 && row.basket_add_rate < 10.0)
        .take(3)
        .cloned()
        .collect();

    ExplorerInsights {
        top_performers,
        hidden_gems,
        biggest_drop_offs,
    }
}

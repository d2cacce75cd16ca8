//! Funnel aggregation: per-stage totals, average ASIN shares, and
//! stage-to-stage conversion and drop-off rates.

use crate::models::{DropOff, FunnelStage, FunnelSummary, SqprRecord};
use crate::numeric::{safe_add, safe_divide, safe_percentage};

pub const STAGE_NAMES: [&str; 4] = ["Impressions", "Clicks", "Basket Adds", "Purchases"];

const PROBLEMATIC_DROP_OFF: f64 = 60.0;

/// Batch-wide sums of every count and share column.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FunnelTotals {
    pub impressions: f64,
    pub impression_share: f64,
    pub clicks: f64,
    pub click_share: f64,
    pub basket_adds: f64,
    pub basket_add_share: f64,
    pub purchases: f64,
    pub purchase_share: f64,
}

pub fn totals(records: &[SqprRecord]) -> FunnelTotals {
    records.iter().fold(FunnelTotals::default(), |acc, row| FunnelTotals {
        impressions: safe_add(acc.impressions, row.impressions),
        impression_share: safe_add(acc.impression_share, row.impression_share),
        clicks: safe_add(acc.clicks, row.clicks),
        click_share: safe_add(acc.click_share, row.click_share),
        basket_adds: safe_add(acc.basket_adds, row.basket_adds),
        basket_add_share: safe_add(acc.basket_add_share, row.basket_add_share),
        purchases: safe_add(acc.purchases, row.purchases),
        purchase_share: safe_add(acc.purchase_share, row.purchase_share),
    })
}

/// Reduce a batch into the four ordered funnel stages plus drop-off
/// diagnostics.
///
/// Drop-off rates use the raw `(prev - current) / prev` formula; a batch of
/// all-zero counts yields non-finite rates, so callers must special-case an
/// empty batch before asking for a funnel.
pub fn aggregate(records: &[SqprRecord]) -> FunnelSummary {
    let sums = totals(records);
    let row_count = records.len().max(1) as f64;

    let stages = vec![
        FunnelStage {
            name: STAGE_NAMES[0].to_string(),
            count: sums.impressions,
            share: safe_divide(sums.impression_share, row_count),
            conversion_rate: None,
        },
        FunnelStage {
            name: STAGE_NAMES[1].to_string(),
            count: sums.clicks,
            share: safe_divide(sums.click_share, row_count),
            conversion_rate: Some(safe_percentage(sums.clicks, sums.impressions)),
        },
        FunnelStage {
            name: STAGE_NAMES[2].to_string(),
            count: sums.basket_adds,
            share: safe_divide(sums.basket_add_share, row_count),
            conversion_rate: Some(safe_percentage(sums.basket_adds, sums.clicks)),
        },
        FunnelStage {
            name: STAGE_NAMES[3].to_string(),
            count: sums.purchases,
            share: safe_divide(sums.purchase_share, row_count),
            conversion_rate: Some(safe_percentage(sums.purchases, sums.basket_adds)),
        },
    ];

    let drop_offs: Vec<DropOff> = stages
        .windows(2)
        .map(|pair| {
            let rate = ((pair[0].count - pair[1].count) / pair[0].count) * 100.0;
            DropOff {
                stage_from: pair[0].name.clone(),
                stage_to: pair[1].name.clone(),
                rate,
                problematic: rate > PROBLEMATIC_DROP_OFF,
            }
        })
        .collect();

    let largest_drop_off = drop_offs
        .iter()
        .skip(1)
        .fold(drop_offs[0].clone(), |max, current| {
            if current.rate > max.rate {
                current.clone()
            } else {
                max
            }
        });

    FunnelSummary {
        stages,
        drop_offs,
        largest_drop_off,
    }
}

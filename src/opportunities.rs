//! Rule-driven opportunity detection.
//!
//! Rules live in one fixed, ordered table so each predicate can be tested on
//! its own and so detection stays deterministic: rows are walked in batch
//! order, rules in declaration order, and the final sort by impact weight is
//! stable.

use crate::models::{
    ImpactTier, Opportunity, OpportunityCategory, OpportunityCounts, PageResponse, RuleView,
    SqprRecord,
};
use crate::numeric::safe_percentage;

pub struct OpportunityRule {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub action: &'static str,
    pub category: OpportunityCategory,
    pub predicate: fn(&SqprRecord) -> bool,
}

impl OpportunityRule {
    pub fn view(&self) -> RuleView {
        RuleView {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            action: self.action.to_string(),
            category: self.category,
        }
    }
}

pub static OPPORTUNITY_RULES: [OpportunityRule; 4] = [
    OpportunityRule {
        id: "hidden-gem",
        name: "Hidden Gem",
        description: "Low market share but high conversion rate - untapped potential",
        action: "Increase PPC spend and improve SEO to capture more traffic",
        category: OpportunityCategory::HiddenGem,
        predicate: |row| row.impression_share < 10.0 && row.purchase_rate > 50.0,
    },
    OpportunityRule {
        id: "funnel-bottleneck",
        name: "Funnel Bottleneck",
        description: "High click rate but low add-to-cart rate - listing optimization needed",
        action: "Optimize product listing, images, and pricing strategy",
        category: OpportunityCategory::FunnelBottleneck,
        predicate: |row| row.click_rate > 10.0 && row.basket_add_rate < 15.0,
    },
    OpportunityRule {
        id: "high-traffic-low-conversion",
        name: "High Traffic, Low Conversion",
        description: "Good visibility but poor conversion - needs optimization",
        action: "Review pricing, improve product images, and enhance A+ content",
        category: OpportunityCategory::FunnelBottleneck,
        predicate: |row| {
            row.impressions > 5_000.0 && safe_percentage(row.purchases, row.impressions) < 1.0
        },
    },
    OpportunityRule {
        id: "share-opportunity",
        name: "Share Opportunity",
        description: "Strong performance metrics with room to grow market share",
        action: "Scale advertising campaigns to capture more market share",
        category: OpportunityCategory::ShareOpportunity,
        predicate: |row| {
            row.click_share > 15.0 && row.purchase_share > 20.0 && row.click_rate > 8.0
        },
    },
];

/// Evaluate every rule against every row and sort the matches by impact
/// weight, highest first. Rules are independent; one row can fire several.
pub fn detect(records: &[SqprRecord]) -> Vec<Opportunity> {
    let mut opportunities = Vec::new();
    for (index, row) in records.iter().enumerate() {
        for rule in &OPPORTUNITY_RULES {
            if (rule.predicate)(row) {
                opportunities.push(Opportunity {
                    id: format!("{}-{}", rule.id, index),
                    rule: rule.view(),
                    record: row.clone(),
                    impact: ImpactTier::from_impressions(row.impressions),
                });
            }
        }
    }
    // sort_by is stable: ties keep generation order.
    opportunities.sort_by(|a, b| b.impact.weight().cmp(&a.impact.weight()));
    opportunities
}

pub fn counts(opportunities: &[Opportunity]) -> OpportunityCounts {
    OpportunityCounts {
        high: opportunities.iter().filter(|o| o.impact == ImpactTier::High).count(),
        medium: opportunities.iter().filter(|o| o.impact == ImpactTier::Medium).count(),
        low: opportunities.iter().filter(|o| o.impact == ImpactTier::Low).count(),
    }
}

/// 1-indexed window over a list; out-of-range pages clamp to empty.
pub fn page<T: Clone>(items: &[T], page: usize, page_size: usize) -> Vec<T> {
    if page == 0 || page_size == 0 {
        return Vec::new();
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return Vec::new();
    }
    let end = (start + page_size).min(items.len());
    items[start..end].to_vec()
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        total_items.div_ceil(page_size)
    }
}

/// Slice the detected list by impact tier, then paginate.
pub fn filter_page(
    opportunities: &[Opportunity],
    impact: Option<ImpactTier>,
    page_number: usize,
    page_size: usize,
) -> PageResponse<Opportunity> {
    let filtered: Vec<Opportunity> = opportunities
        .iter()
        .filter(|o| impact.map_or(true, |tier| o.impact == tier))
        .cloned()
        .collect();
    let items = page(&filtered, page_number, page_size);
    PageResponse {
        items,
        page: page_number,
        page_size,
        total_items: filtered.len(),
        total_pages: total_pages(filtered.len(), page_size),
    }
}

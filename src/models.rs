use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub const COL_SEARCH_QUERY: &str = "Search Query";
pub const COL_SEARCH_QUERY_SCORE: &str = "Search Query Score";
pub const COL_IMPRESSIONS: &str = "Impressions: Total Count";
pub const COL_IMPRESSION_SHARE: &str = "Impressions: ASIN Share %";
pub const COL_CLICKS: &str = "Clicks: Total Count";
pub const COL_CLICK_RATE: &str = "Clicks: Click Rate %";
pub const COL_CLICK_SHARE: &str = "Clicks: ASIN Share %";
pub const COL_BASKET_ADDS: &str = "Basket Adds: Total Count";
pub const COL_BASKET_ADD_RATE: &str = "Basket Adds: Basket Add Rate %";
pub const COL_BASKET_ADD_SHARE: &str = "Basket Adds: ASIN Share %";
pub const COL_PURCHASES: &str = "Purchases: Total Count";
pub const COL_PURCHASE_RATE: &str = "Purchases: Purchase Rate %";
pub const COL_PURCHASE_SHARE: &str = "Purchases: ASIN Share %";

/// Columns that must be present for a batch to be accepted at all.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    COL_SEARCH_QUERY,
    COL_IMPRESSIONS,
    COL_CLICKS,
    COL_BASKET_ADDS,
    COL_PURCHASES,
];

/// The fixed SQPR vocabulary, in report column order. Anything outside this
/// list rides along in `SqprRecord::extra` untouched.
pub const KNOWN_COLUMNS: [&str; 13] = [
    COL_SEARCH_QUERY,
    COL_SEARCH_QUERY_SCORE,
    COL_IMPRESSIONS,
    COL_IMPRESSION_SHARE,
    COL_CLICKS,
    COL_CLICK_RATE,
    COL_CLICK_SHARE,
    COL_BASKET_ADDS,
    COL_BASKET_ADD_RATE,
    COL_BASKET_ADD_SHARE,
    COL_PURCHASES,
    COL_PURCHASE_RATE,
    COL_PURCHASE_SHARE,
];

/// One cell of an uploaded report: either the query text or a number, and
/// frequently a number that arrived as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn as_display(&self) -> String {
        match self {
            Self::Number(value) => format_cell_number(*value),
            Self::Text(text) => text.clone(),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Numbers are rendered the way the report writes them: integers without a
/// trailing `.0`.
pub fn format_cell_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// A row exactly as it came off the parser: column name to untyped cell.
pub type RawRecord = BTreeMap<String, CellValue>;

/// A normalized SQPR row. Every numeric field is a finite number after
/// `normalize::normalize`; unrecognized columns are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqprRecord {
    #[serde(rename = "Search Query")]
    pub search_query: String,
    #[serde(rename = "Search Query Score")]
    pub search_query_score: f64,
    #[serde(rename = "Impressions: Total Count")]
    pub impressions: f64,
    #[serde(rename = "Impressions: ASIN Share %")]
    pub impression_share: f64,
    #[serde(rename = "Clicks: Total Count")]
    pub clicks: f64,
    #[serde(rename = "Clicks: Click Rate %")]
    pub click_rate: f64,
    #[serde(rename = "Clicks: ASIN Share %")]
    pub click_share: f64,
    #[serde(rename = "Basket Adds: Total Count")]
    pub basket_adds: f64,
    #[serde(rename = "Basket Adds: Basket Add Rate %")]
    pub basket_add_rate: f64,
    #[serde(rename = "Basket Adds: ASIN Share %")]
    pub basket_add_share: f64,
    #[serde(rename = "Purchases: Total Count")]
    pub purchases: f64,
    #[serde(rename = "Purchases: Purchase Rate %")]
    pub purchase_rate: f64,
    #[serde(rename = "Purchases: ASIN Share %")]
    pub purchase_share: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, CellValue>,
}

impl SqprRecord {
    /// Flatten back into the open column-to-cell shape used for export.
    pub fn to_raw(&self) -> RawRecord {
        let mut raw = RawRecord::new();
        raw.insert(COL_SEARCH_QUERY.into(), CellValue::Text(self.search_query.clone()));
        raw.insert(COL_SEARCH_QUERY_SCORE.into(), self.search_query_score.into());
        raw.insert(COL_IMPRESSIONS.into(), self.impressions.into());
        raw.insert(COL_IMPRESSION_SHARE.into(), self.impression_share.into());
        raw.insert(COL_CLICKS.into(), self.clicks.into());
        raw.insert(COL_CLICK_RATE.into(), self.click_rate.into());
        raw.insert(COL_CLICK_SHARE.into(), self.click_share.into());
        raw.insert(COL_BASKET_ADDS.into(), self.basket_adds.into());
        raw.insert(COL_BASKET_ADD_RATE.into(), self.basket_add_rate.into());
        raw.insert(COL_BASKET_ADD_SHARE.into(), self.basket_add_share.into());
        raw.insert(COL_PURCHASES.into(), self.purchases.into());
        raw.insert(COL_PURCHASE_RATE.into(), self.purchase_rate.into());
        raw.insert(COL_PURCHASE_SHARE.into(), self.purchase_share.into());
        for (column, cell) in &self.extra {
            raw.insert(column.clone(), cell.clone());
        }
        raw
    }
}

/// Sortable columns of the explorer table. Wire names are the literal SQPR
/// column headers so the frontend can reuse them as table keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKey {
    #[serde(rename = "Search Query")]
    SearchQuery,
    #[serde(rename = "Search Query Score")]
    SearchQueryScore,
    #[serde(rename = "Impressions: Total Count")]
    Impressions,
    #[serde(rename = "Impressions: ASIN Share %")]
    ImpressionShare,
    #[serde(rename = "Clicks: Total Count")]
    Clicks,
    #[serde(rename = "Clicks: Click Rate %")]
    ClickRate,
    #[serde(rename = "Clicks: ASIN Share %")]
    ClickShare,
    #[serde(rename = "Basket Adds: Total Count")]
    BasketAdds,
    #[serde(rename = "Basket Adds: Basket Add Rate %")]
    BasketAddRate,
    #[serde(rename = "Basket Adds: ASIN Share %")]
    BasketAddShare,
    #[serde(rename = "Purchases: Total Count")]
    Purchases,
    #[serde(rename = "Purchases: Purchase Rate %")]
    PurchaseRate,
    #[serde(rename = "Purchases: ASIN Share %")]
    PurchaseShare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpportunityCategory {
    HiddenGem,
    FunnelBottleneck,
    PriceOptimization,
    ShareOpportunity,
}

impl OpportunityCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HiddenGem => "hidden-gem",
            Self::FunnelBottleneck => "funnel-bottleneck",
            Self::PriceOptimization => "price-optimization",
            Self::ShareOpportunity => "share-opportunity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImpactTier {
    High,
    Medium,
    Low,
}

impl ImpactTier {
    /// Impact is driven purely by impression volume.
    pub fn from_impressions(impressions: f64) -> Self {
        if impressions > 10_000.0 {
            Self::High
        } else if impressions > 3_000.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn weight(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Serializable face of a detection rule (the predicate stays behind in the
/// rule table).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub action: String,
    pub category: OpportunityCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: String,
    pub rule: RuleView,
    pub record: SqprRecord,
    pub impact: ImpactTier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelStage {
    pub name: String,
    pub count: f64,
    pub share: f64,
    pub conversion_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropOff {
    pub stage_from: String,
    pub stage_to: String,
    pub rate: f64,
    pub problematic: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelSummary {
    pub stages: Vec<FunnelStage>,
    pub drop_offs: Vec<DropOff>,
    pub largest_drop_off: DropOff,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageMetric {
    pub name: String,
    pub total: f64,
    pub average_share: f64,
    pub formatted_total: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewMetrics {
    pub metrics: Vec<StageMetric>,
    pub row_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryType {
    #[serde(rename = "Rising Star")]
    RisingStar,
    #[serde(rename = "Stable Performer")]
    StablePerformer,
    #[serde(rename = "Needs Attention")]
    NeedsAttention,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerRequest {
    #[serde(default)]
    pub search_term: String,
    #[serde(default = "default_sort_by")]
    pub sort_by: ColumnKey,
    #[serde(default = "default_sort_order")]
    pub sort_order: SortOrder,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ExplorerRequest {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            sort_by: default_sort_by(),
            sort_order: default_sort_order(),
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

fn default_sort_by() -> ColumnKey {
    ColumnKey::Impressions
}

fn default_sort_order() -> SortOrder {
    SortOrder::Desc
}

fn default_page() -> usize {
    1
}

pub fn default_page_size() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerRow {
    #[serde(flatten)]
    pub record: SqprRecord,
    pub query_type: QueryType,
    pub performance_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerResponse {
    pub rows: Vec<ExplorerRow>,
    pub total_rows: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerInsights {
    pub top_performers: Vec<SqprRecord>,
    pub hidden_gems: Vec<SqprRecord>,
    pub biggest_drop_offs: Vec<SqprRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    pub batch_id: Uuid,
    pub row_count: usize,
    pub opportunity_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub batch_id: Option<Uuid>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub row_count: usize,
    pub opportunity_count: usize,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub content: String,
    pub row_count: usize,
}

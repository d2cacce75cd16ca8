//! The single mutable state container behind the UI.
//!
//! One `DashboardCore` exists per app session. Mutation happens only through
//! the named actions (`load_batch`, `reset`, `set_loading`, `set_error`);
//! everything else is a read-only view recomputed from the normalized batch
//! on demand. A failed load never clobbers a previously loaded batch, and a
//! second load simply replaces state wholesale (last write wins).

use crate::csv_io::{export_csv, parse_csv_text, sample_batch};
use crate::errors::{AppError, AppResult};
use crate::explorer::{explore, insights};
use crate::funnel::aggregate;
use crate::models::{
    DashboardSnapshot, ExplorerInsights, ExplorerRequest, ExplorerResponse, ExportResponse,
    FunnelSummary, ImpactTier, LoadSummary, Opportunity, OverviewMetrics, PageResponse,
    OpportunityCounts, RawRecord, SqprRecord, default_page_size,
};
use crate::normalize::{normalize, validate_batch};
use crate::opportunities::{counts, detect, filter_page};
use crate::overview::overview;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

#[derive(Debug, Default)]
struct DashboardState {
    batch_id: Option<Uuid>,
    loaded_at: Option<DateTime<Utc>>,
    records: Vec<SqprRecord>,
    opportunities: Vec<Opportunity>,
    is_loading: bool,
    error: Option<String>,
}

#[derive(Clone, Default)]
pub struct DashboardCore {
    state: Arc<RwLock<DashboardState>>,
}

impl DashboardCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate, normalize, and install a new batch. On validation failure
    /// the previous batch is left untouched and the error is recorded.
    pub fn load_batch(&self, raw: Vec<RawRecord>) -> AppResult<LoadSummary> {
        self.set_loading(true);
        match self.ingest(raw) {
            Ok(summary) => {
                tracing::info!(
                    batch_id = %summary.batch_id,
                    rows = summary.row_count,
                    opportunities = summary.opportunity_count,
                    "batch loaded"
                );
                Ok(summary)
            }
            Err(error) => {
                tracing::warn!(error = %error, "batch load rejected");
                let mut state = self.state.write().expect("dashboard state write lock");
                state.error = Some(error.to_string());
                state.is_loading = false;
                Err(error)
            }
        }
    }

    fn ingest(&self, raw: Vec<RawRecord>) -> AppResult<LoadSummary> {
        validate_batch(&raw)?;
        let records = normalize(&raw);
        let opportunities = detect(&records);
        let summary = LoadSummary {
            batch_id: Uuid::new_v4(),
            row_count: records.len(),
            opportunity_count: opportunities.len(),
        };

        let mut state = self.state.write().expect("dashboard state write lock");
        state.batch_id = Some(summary.batch_id);
        state.loaded_at = Some(Utc::now());
        state.records = records;
        state.opportunities = opportunities;
        state.error = None;
        state.is_loading = false;
        Ok(summary)
    }

    pub fn load_csv_text(&self, text: &str) -> AppResult<LoadSummary> {
        self.set_loading(true);
        let raw = match parse_csv_text(text) {
            Ok(raw) => raw,
            Err(error) => {
                let mut state = self.state.write().expect("dashboard state write lock");
                state.error = Some(error.to_string());
                state.is_loading = false;
                return Err(error);
            }
        };
        self.load_batch(raw)
    }

    pub fn load_sample_batch(&self) -> AppResult<LoadSummary> {
        self.load_batch(sample_batch())
    }

    /// Wipe everything back to the empty state.
    pub fn reset(&self) {
        tracing::info!("dashboard reset");
        let mut state = self.state.write().expect("dashboard state write lock");
        *state = DashboardState::default();
    }

    pub fn set_loading(&self, loading: bool) {
        let mut state = self.state.write().expect("dashboard state write lock");
        state.is_loading = loading;
    }

    /// Set or clear the error flag. Either way the loading flag drops, so a
    /// spinner never outlives the attempt that raised it.
    pub fn set_error(&self, error: Option<String>) {
        let mut state = self.state.write().expect("dashboard state write lock");
        state.error = error;
        state.is_loading = false;
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let state = self.state.read().expect("dashboard state read lock");
        DashboardSnapshot {
            batch_id: state.batch_id,
            loaded_at: state.loaded_at,
            row_count: state.records.len(),
            opportunity_count: state.opportunities.len(),
            is_loading: state.is_loading,
            error: state.error.clone(),
        }
    }

    pub fn overview(&self) -> OverviewMetrics {
        let state = self.state.read().expect("dashboard state read lock");
        overview(&state.records)
    }

    /// `None` for an empty batch: drop-off math is undefined without rows.
    pub fn funnel(&self) -> Option<FunnelSummary> {
        let state = self.state.read().expect("dashboard state read lock");
        if state.records.is_empty() {
            None
        } else {
            Some(aggregate(&state.records))
        }
    }

    pub fn opportunities(
        &self,
        impact: Option<ImpactTier>,
        page: Option<usize>,
        page_size: Option<usize>,
    ) -> PageResponse<Opportunity> {
        let state = self.state.read().expect("dashboard state read lock");
        filter_page(
            &state.opportunities,
            impact,
            page.unwrap_or(1),
            page_size.unwrap_or_else(default_page_size),
        )
    }

    pub fn opportunity_counts(&self) -> OpportunityCounts {
        let state = self.state.read().expect("dashboard state read lock");
        counts(&state.opportunities)
    }

    pub fn explore(&self, request: &ExplorerRequest) -> ExplorerResponse {
        let state = self.state.read().expect("dashboard state read lock");
        explore(&state.records, request)
    }

    pub fn insights(&self) -> ExplorerInsights {
        let state = self.state.read().expect("dashboard state read lock");
        insights(&state.records)
    }

    pub fn export(&self) -> AppResult<ExportResponse> {
        let state = self.state.read().expect("dashboard state read lock");
        if state.records.is_empty() {
            return Err(AppError::Validation("no batch loaded to export".to_string()));
        }
        Ok(ExportResponse {
            content: export_csv(&state.records),
            row_count: state.records.len(),
        })
    }
}

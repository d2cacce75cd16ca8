pub mod csv_io;
pub mod dashboard;
pub mod errors;
pub mod explorer;
pub mod funnel;
pub mod models;
pub mod normalize;
pub mod numeric;
pub mod opportunities;
pub mod overview;

pub use crate::dashboard::DashboardCore;
pub use crate::errors::{AppError, AppResult};

use crate::models::{
    DashboardSnapshot, ExplorerInsights, ExplorerRequest, ExplorerResponse, ExportResponse,
    FunnelSummary, ImpactTier, LoadSummary, Opportunity, OpportunityCounts, OverviewMetrics,
    PageResponse, RawRecord,
};
use std::path::Path;
use tauri::Manager;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

#[derive(Clone)]
struct AppState {
    core: DashboardCore,
}

#[tauri::command]
fn load_batch(state: tauri::State<'_, AppState>, records: Vec<RawRecord>) -> Result<LoadSummary, String> {
    state.core.load_batch(records).map_err(to_client_error)
}

#[tauri::command]
fn load_csv_text(state: tauri::State<'_, AppState>, text: String) -> Result<LoadSummary, String> {
    state.core.load_csv_text(&text).map_err(to_client_error)
}

#[tauri::command]
fn load_sample_batch(state: tauri::State<'_, AppState>) -> Result<LoadSummary, String> {
    state.core.load_sample_batch().map_err(to_client_error)
}

#[tauri::command]
fn reset_dashboard(state: tauri::State<'_, AppState>) {
    state.core.reset();
}

#[tauri::command]
fn set_loading(state: tauri::State<'_, AppState>, loading: bool) {
    state.core.set_loading(loading);
}

#[tauri::command]
fn set_error(state: tauri::State<'_, AppState>, error: Option<String>) {
    state.core.set_error(error);
}

#[tauri::command]
fn dashboard_snapshot(state: tauri::State<'_, AppState>) -> DashboardSnapshot {
    state.core.snapshot()
}

#[tauri::command]
fn overview_get(state: tauri::State<'_, AppState>) -> OverviewMetrics {
    state.core.overview()
}

#[tauri::command]
fn funnel_get(state: tauri::State<'_, AppState>) -> Option<FunnelSummary> {
    state.core.funnel()
}

#[tauri::command]
fn opportunities_list(
    state: tauri::State<'_, AppState>,
    impact: Option<ImpactTier>,
    page: Option<usize>,
    page_size: Option<usize>,
) -> PageResponse<Opportunity> {
    state.core.opportunities(impact, page, page_size)
}

#[tauri::command]
fn opportunity_counts(state: tauri::State<'_, AppState>) -> OpportunityCounts {
    state.core.opportunity_counts()
}

#[tauri::command]
fn explorer_query(
    state: tauri::State<'_, AppState>,
    request: ExplorerRequest,
) -> ExplorerResponse {
    state.core.explore(&request)
}

#[tauri::command]
fn explorer_insights(state: tauri::State<'_, AppState>) -> ExplorerInsights {
    state.core.insights()
}

#[tauri::command]
fn export_csv(state: tauri::State<'_, AppState>) -> Result<ExportResponse, String> {
    state.core.export().map_err(to_client_error)
}

pub fn run() {
    tauri::Builder::default()
        .setup(|app| {
            let app_data_dir = app.path().app_data_dir().map_err(|error| error.to_string())?;
            std::fs::create_dir_all(&app_data_dir).map_err(|error| error.to_string())?;
            init_tracing(&app_data_dir).map_err(|error| error.to_string())?;

            app.manage(AppState {
                core: DashboardCore::new(),
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            load_batch,
            load_csv_text,
            load_sample_batch,
            reset_dashboard,
            set_loading,
            set_error,
            dashboard_snapshot,
            overview_get,
            funnel_get,
            opportunities_list,
            opportunity_counts,
            explorer_query,
            explorer_insights,
            export_csv
        ])
        .run(tauri::generate_context!())
        .expect("failed to run tauri app");
}

fn init_tracing(app_data_dir: &Path) -> Result<(), String> {
    let log_dir = app_data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "analyser.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}

fn to_client_error(error: impl std::fmt::Display) -> String {
    error.to_string()
}

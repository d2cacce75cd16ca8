use sqpr_analyser_lib::models::{ColumnKey, ExplorerRequest, ImpactTier, SortOrder};
use sqpr_analyser_lib::DashboardCore;

fn load_fixture(core: &DashboardCore) {
    let text = std::fs::read_to_string("tests/fixtures/sample.csv").expect("read fixture");
    core.load_csv_text(&text).expect("load fixture");
}

#[test]
fn fixture_loads_and_detects_opportunities() {
    let core = DashboardCore::new();
    load_fixture(&core);

    let snapshot = core.snapshot();
    assert_eq!(snapshot.row_count, 5);
    assert!(snapshot.error.is_none());
    assert!(!snapshot.is_loading);

    let counts = core.opportunity_counts();
    assert_eq!(counts.high, 4);
    assert_eq!(counts.medium, 2);
    assert_eq!(counts.low, 1);

    // The list is ordered high to low.
    let all = core.opportunities(None, Some(1), Some(50));
    assert_eq!(all.total_items, 7);
    assert_eq!(all.items[0].impact, ImpactTier::High);
    assert_eq!(all.items[6].impact, ImpactTier::Low);
    assert_eq!(all.items[6].record.search_query, "usb cable");

    let highs = core.opportunities(Some(ImpactTier::High), Some(1), Some(10));
    assert_eq!(highs.total_items, 4);
    assert_eq!(highs.total_pages, 1);
}

#[test]
fn fixture_funnel_and_overview() {
    let core = DashboardCore::new();
    load_fixture(&core);

    let funnel = core.funnel().expect("funnel");
    assert_eq!(funnel.stages[0].count, 58_870.0);
    assert_eq!(funnel.stages[1].count, 2_887.0);
    assert_eq!(funnel.stages[2].count, 595.0);
    assert_eq!(funnel.stages[3].count, 335.0);
    assert!(funnel.drop_offs[0].problematic);
    assert_eq!(funnel.largest_drop_off.stage_from, "Impressions");

    let overview = core.overview();
    assert_eq!(overview.metrics[0].total, 58_870.0);
    assert!((overview.metrics[0].average_share - 9.22).abs() < 1e-9);
}

#[test]
fn fixture_rates_are_derived_where_blank() {
    let core = DashboardCore::new();
    load_fixture(&core);

    let response = core.explore(&ExplorerRequest {
        search_term: "usb cable".to_string(),
        ..ExplorerRequest::default()
    });
    assert_eq!(response.total_rows, 1);
    let row = &response.rows[0].record;
    assert_eq!(row.click_rate, 9.0);
    assert!((row.basket_add_rate - 20.0 / 180.0 * 100.0).abs() < 1e-9);
    assert_eq!(row.purchase_rate, 75.0);
    // The passthrough column survives normalization.
    assert!(row.extra.contains_key("Reporting Date"));
}

#[test]
fn explorer_filters_and_sorts_the_fixture() {
    let core = DashboardCore::new();
    load_fixture(&core);

    let response = core.explore(&ExplorerRequest {
        search_term: "phone".to_string(),
        sort_by: ColumnKey::Impressions,
        sort_order: SortOrder::Desc,
        page: 1,
        page_size: 10,
    });
    assert_eq!(response.total_rows, 2);
    assert_eq!(response.rows[0].record.search_query, "phone case");
    assert_eq!(response.rows[1].record.search_query, "wireless headphones");
}

#[test]
fn export_round_trips_through_a_second_core() {
    let first = DashboardCore::new();
    load_fixture(&first);
    let export = first.export().expect("export");

    // Write the export to disk and reload it the way a user would.
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("export.csv");
    std::fs::write(&path, &export.content).expect("write export");
    let reloaded = std::fs::read_to_string(&path).expect("read export");

    let second = DashboardCore::new();
    second.load_csv_text(&reloaded).expect("reload export");
    assert_eq!(second.snapshot().row_count, 5);
    let counts = second.opportunity_counts();
    assert_eq!((counts.high, counts.medium, counts.low), (4, 2, 1));
}

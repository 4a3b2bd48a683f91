// EVGuard - tests/engine_e2e.rs
//
// End-to-end tests for the analysis pipeline: a raw charging log and
// reference CSVs on disk, through parsing, scoring, filtering, export,
// and report rendering. No mocks; real files, real chrono parsing.

use evguard::core::engine::{score_transactions, summarize, ScoringConfig};
use evguard::core::export;
use evguard::core::filter::{apply_filters, FilterState, SortKey};
use evguard::core::model::{
    Detection, DiscrepancyFlag, RegistryRecord, ScoredVehicle, ViolationKind,
};
use evguard::core::parser::{parse_log, ParseConfig};
use evguard::core::reference::{load_detections_csv, load_registry_csv};
use evguard::core::report::{render_report, ReportOptions};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

// =============================================================================
// Helpers
// =============================================================================

/// Absolute path to the on-disk fixture files.
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn as_of() -> NaiveDate {
    "2025-10-31".parse().unwrap()
}

fn load_fixture_datasets() -> (HashMap<String, Detection>, HashMap<String, RegistryRecord>) {
    let detections = load_detections_csv(&fixture("detections.csv")).unwrap();
    let registry = load_registry_csv(&fixture("registry.csv")).unwrap();
    (detections, registry)
}

fn run_pipeline() -> Vec<ScoredVehicle> {
    let raw = fs::read_to_string(fixture("charging_day.log")).unwrap();
    let transactions = parse_log(&raw, &ParseConfig::default()).unwrap();
    let (detections, registry) = load_fixture_datasets();
    score_transactions(
        &transactions,
        &detections,
        &registry,
        &ScoringConfig::default(),
        as_of(),
    )
}

fn by_plate<'a>(scored: &'a [ScoredVehicle], plate: &str) -> &'a ScoredVehicle {
    scored
        .iter()
        .find(|sv| sv.plate == plate)
        .unwrap_or_else(|| panic!("no scored vehicle for {plate}"))
}

// =============================================================================
// Pipeline E2E
// =============================================================================

/// The day's log parses to one scored vehicle per transaction, with extra
/// columns preserved untyped.
#[test]
fn e2e_log_parses_with_extra_columns() {
    let raw = fs::read_to_string(fixture("charging_day.log")).unwrap();
    let transactions = parse_log(&raw, &ParseConfig::default()).unwrap();

    assert_eq!(transactions.len(), 8);
    assert_eq!(
        transactions[0].extras.get("session_id").map(String::as_str),
        Some("S-1001")
    );
}

/// Known fixture outcomes across all scoring categories.
#[test]
fn e2e_scores_match_expected_fixture_outcomes() {
    let scored = run_pipeline();
    assert_eq!(scored.len(), 8);

    // Over-billed session on an otherwise clean record.
    let suspicious = by_plate(&scored, "KA03AB1234");
    assert_eq!(suspicious.charging.flag, DiscrepancyFlag::Suspicious);
    assert_eq!(suspicious.compliance.score, 80);

    // Expired insurance + pending fine + tax due, plus helmet advisory.
    let offender = by_plate(&scored, "KA05MN4455");
    assert_eq!(offender.compliance.score, 40);
    let kinds: Vec<_> = offender
        .compliance
        .violations
        .iter()
        .map(|v| v.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            ViolationKind::Insurance,
            ViolationKind::Fine,
            ViolationKind::RoadTax,
            ViolationKind::HelmetAdvisory,
        ]
    );

    // Fully compliant.
    let clean = by_plate(&scored, "KA01QQ7788");
    assert_eq!(clean.compliance.score, 100);
    assert!(clean.compliance.violations.is_empty());

    // Unknown plate: failing defaults for every registry category.
    let unknown = by_plate(&scored, "KA77ZZ0001");
    assert_eq!(unknown.compliance.score, 20);
    assert_eq!(unknown.registry.owner, "Unknown");
    assert_eq!(unknown.charging.flag, DiscrepancyFlag::Ok);
}

/// Three out-of-tolerance sessions on EV-CH-09 escalate all three to the
/// charger-level fault flag.
#[test]
fn e2e_charger_fault_detected_across_vehicles() {
    let scored = run_pipeline();

    for plate in ["KA21GH3344", "KA22HJ5566", "KA23KL7788"] {
        let sv = by_plate(&scored, plate);
        assert_eq!(
            sv.charging.flag,
            DiscrepancyFlag::PotentialChargerFault,
            "{plate} should carry the charger-level flag"
        );
        assert_eq!(sv.charging.charger_id, "EV-CH-09");
    }

    let summary = summarize(&scored);
    assert_eq!(summary.vehicle_count, 8);
    assert_eq!(summary.discrepancy_count, 4);
    assert_eq!(summary.faulty_charger_count, 1);
    assert!((summary.mean_score - 62.5).abs() < 1e-9);
}

/// Filtering the scored list down to discrepancies, sorted worst-first.
#[test]
fn e2e_filter_discrepancies_sorted_by_difference() {
    let scored = run_pipeline();

    let mut filter = FilterState::default();
    filter.flags.insert(DiscrepancyFlag::Suspicious);
    filter.flags.insert(DiscrepancyFlag::PotentialChargerFault);
    filter.sort_key = SortKey::Difference;
    filter.sort_ascending = false;

    let indices = apply_filters(&scored, &filter);
    assert_eq!(indices.len(), 4);
    // The three 5.0 kWh mismatches sort ahead of the 2.5 kWh one.
    assert_eq!(scored[indices[3]].plate, "KA03AB1234");
}

/// CSV and JSON exports reflect the filtered view only.
#[test]
fn e2e_export_filtered_view() {
    let scored = run_pipeline();
    let filter = FilterState {
        violations_only: true,
        ..FilterState::default()
    };
    let indices = apply_filters(&scored, &filter);
    assert!(!indices.is_empty());

    let mut csv_buf = Vec::new();
    export::export_csv(&mut csv_buf, &scored, &indices).unwrap();
    let csv_text = String::from_utf8(csv_buf).unwrap();
    assert_eq!(csv_text.lines().count(), indices.len() + 1);
    assert!(!csv_text.contains("KA01QQ7788"), "clean vehicle exported");

    let mut json_buf = Vec::new();
    export::export_json(&mut json_buf, &scored, &indices).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&json_buf).unwrap();
    assert_eq!(value.as_array().unwrap().len(), indices.len());
}

/// The rendered report carries every section and the fixture's headline
/// numbers.
#[test]
fn e2e_report_renders_full_day() {
    let scored = run_pipeline();
    let summary = summarize(&scored);
    let indices: Vec<usize> = (0..scored.len()).collect();
    let options = ReportOptions {
        report_date: as_of(),
        ..ReportOptions::default()
    };

    let report = render_report(&scored, &indices, &summary, &options).unwrap();
    assert!(report.contains("EVGuard COMPLIANCE REPORT"));
    assert!(report.contains("Vehicles scored:        8"));
    assert!(report.contains("Mean compliance score:  62.5"));
    assert!(report.contains("Fine Pending: \u{20b9}500 on KA05MN4455"));
    assert!(report.contains("[charger fault suspected]"));
}

/// Running the pipeline twice over the same inputs is bit-for-bit stable.
#[test]
fn e2e_pipeline_is_deterministic() {
    let first = run_pipeline();
    let second = run_pipeline();

    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.plate, b.plate);
        assert_eq!(a.compliance.score, b.compliance.score);
        assert_eq!(a.charging.flag, b.charging.flag);
        assert_eq!(
            a.compliance.violations.len(),
            b.compliance.violations.len()
        );
    }
}

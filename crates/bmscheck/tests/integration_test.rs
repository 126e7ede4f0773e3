//! Integration tests for bmscheck.

use std::io::Write;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tempfile::{Builder, NamedTempFile, TempDir};

use bmscheck::{
    BmsCheck, BmsCheckError, CancellationToken, ColumnRole, DetectorKind, LoadStrategy,
    PhysicalType, Severity, SpikeMethod, ValidationConfig, ValidationResult,
};

/// Helper to create a temporary file with given content and extension.
fn create_test_file(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Timestamp of row `i` at a 15-minute interval.
fn timestamp(i: usize) -> String {
    (base_time() + Duration::minutes(15 * i as i64))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// A well-behaved reading for row `i`.
fn steady(i: usize) -> String {
    format!("{:.1}", 55.0 + ((i * 7) % 11) as f64 * 0.1)
}

/// Build a two-column export `Timestamp,<name>` from per-row values.
fn export(name: &str, values: &[String]) -> String {
    let mut out = format!("Timestamp,{}\n", name);
    for (i, v) in values.iter().enumerate() {
        out.push_str(&format!("{},{}\n", timestamp(i), v));
    }
    out
}

fn validate(content: &str) -> ValidationResult {
    let file = create_test_file(content, ".csv");
    BmsCheck::new()
        .unwrap()
        .validate_path(file.path())
        .expect("Validation failed")
}

/// A multi-column export with one of every problem.
fn messy_export(rows: usize) -> String {
    let mut out = String::from("Timestamp,AHU1_SAT,AHU1_RAT,ZN1_RH,Site\n");
    for i in 0..rows {
        let sat = match i {
            20..=25 => String::new(),
            40 => "N/A".to_string(),
            90 => "ERR#12".to_string(),
            150 => "900".to_string(),
            _ => steady(i),
        };
        let rat = match i {
            60 => "COMM FAIL".to_string(),
            200 => "140".to_string(),
            _ => format!("{:.1}", 72.0 + ((i * 3) % 7) as f64 * 0.2),
        };
        let rh = match i {
            75 => "104".to_string(),
            76 => "\u{FFFD}".to_string(),
            _ => format!("{:.1}", 45.0 + ((i * 5) % 9) as f64 * 0.5),
        };
        let site = if i % 50 == 0 { "" } else { "North" };
        out.push_str(&format!("{},{},{},{},{}\n", timestamp(i), sat, rat, rh, site));
    }
    out
}

// =============================================================================
// Basic Functionality Tests
// =============================================================================

#[test]
fn test_validate_basic_csv() {
    let values: Vec<String> = (0..96).map(steady).collect();
    let result = validate(&export("AHU1_SAT", &values));

    assert_eq!(result.metadata.source.row_count, 96);
    assert_eq!(result.metadata.source.column_count, 2);
    assert_eq!(result.metadata.source.format, "csv");
    assert!(result.metadata.source.hash.starts_with("sha256:"));
    assert_eq!(result.metadata.strategy, LoadStrategy::InMemory);
    assert_eq!(result.columns[0].role, ColumnRole::Timestamp);
    assert_eq!(result.columns[1].role, ColumnRole::Sensor);
    assert_eq!(result.columns[1].physical_type, Some(PhysicalType::Temperature));
    assert!(result.issues.is_empty());
    assert_eq!(result.score, 100.0);
}

#[test]
fn test_validate_tsv_with_niagara_timestamps() {
    let mut content = String::from("Timestamp\tVAV2_ZN_T\n");
    for i in 0..48 {
        let ts = base_time() + Duration::minutes(30 * i as i64);
        content.push_str(&format!(
            "{} EST\t{}\n",
            ts.format("%d-%b-%y %I:%M:%S %p"),
            steady(i)
        ));
    }
    let file = create_test_file(&content, ".tsv");
    let result = BmsCheck::new().unwrap().validate_path(file.path()).unwrap();

    assert_eq!(result.metadata.source.format, "tsv");
    assert_eq!(result.metadata.time_axis.as_deref(), Some("Timestamp"));
    assert!(result.issues.is_empty());
}

#[test]
fn test_validate_reader_with_media_type() {
    let values: Vec<String> = (0..20).map(steady).collect();
    let content = export("AHU1_SAT", &values);
    let result = BmsCheck::new()
        .unwrap()
        .validate_reader(content.as_bytes(), "text/csv; charset=utf-8", None)
        .unwrap();
    assert_eq!(result.metadata.source.row_count, 20);
}

// =============================================================================
// Detector Scenarios
// =============================================================================

#[test]
fn test_placeholder_null_and_error_code_in_1000_rows() {
    let mut values: Vec<String> = (0..1000).map(steady).collect();
    values[100] = "-9999".to_string();
    values[500] = "ERR#12".to_string();
    let result = validate(&export("Value", &values));

    assert_eq!(result.issues.len(), 2, "{:#?}", result.issues);

    let null = result
        .issues_of_kind(DetectorKind::Null)
        .next()
        .expect("null issue");
    assert_eq!(null.severity, Severity::Low);
    assert_eq!(null.row, Some(100));
    assert_eq!(null.raw_value.as_deref(), Some("-9999"));

    let junk = result
        .issues_of_kind(DetectorKind::Junk)
        .next()
        .expect("junk issue");
    assert_eq!(junk.severity, Severity::High);
    assert_eq!(junk.row, Some(500));
}

#[test]
fn test_all_null_column_is_one_critical_issue() {
    let values = vec![String::new(); 10];
    let result = validate(&export("ZN2_T", &values));

    assert_eq!(result.issues.len(), 1);
    let issue = &result.issues[0];
    assert_eq!(issue.kind, DetectorKind::Null);
    assert_eq!(issue.severity, Severity::Critical);
    assert!(issue.row.is_none());
    assert_eq!(result.totals.critical, 1);
    // One critical issue costs 60 * (1 - e^(-5/60)).
    assert_eq!(result.score, 95.2);
}

#[test]
fn test_hundred_sigma_value_reaches_quorum() {
    let mut values: Vec<String> = (0..200).map(steady).collect();
    // Cluster std is about 0.32; this is roughly 100 standard deviations away.
    values[120] = "87.5".to_string();
    let result = validate(&export("AHU1_SAT", &values));

    let spikes: Vec<_> = result.issues_of_kind(DetectorKind::Spike).collect();
    assert_eq!(spikes.len(), 1, "{:#?}", result.issues);
    let spike = spikes[0];
    assert_eq!(spike.row, Some(120));
    assert_eq!(spike.severity, Severity::High);
    assert!(spike.methods.contains(&SpikeMethod::ZScore));
    assert!(spike.methods.contains(&SpikeMethod::Iqr));
    assert!(spike.methods.contains(&SpikeMethod::ModifiedZ));
}

#[test]
fn test_spike_outside_range_is_single_critical() {
    let mut values: Vec<String> = (0..200).map(steady).collect();
    values[80] = "-400".to_string();
    let result = validate(&export("AHU1_SAT", &values));

    let at_row: Vec<_> = result.issues.iter().filter(|i| i.row == Some(80)).collect();
    assert_eq!(at_row.len(), 1);
    assert_eq!(at_row[0].kind, DetectorKind::Spike);
    assert_eq!(at_row[0].severity, Severity::Critical);
    assert_eq!(at_row[0].escalated_by, Some(DetectorKind::Range));
    assert!(result.issues_of_kind(DetectorKind::Range).next().is_none());
}

#[test]
fn test_zero_variance_degrades_gracefully() {
    let values = vec!["21.0".to_string(); 50];
    let result = validate(&export("ZN1_T", &values));

    assert!(result.issues_of_kind(DetectorKind::Spike).next().is_none());
    let reasons: Vec<&str> = result
        .metadata
        .skipped_checks
        .iter()
        .filter(|s| s.detector == DetectorKind::Spike)
        .map(|s| s.reason.as_str())
        .collect();
    assert!(reasons.iter().any(|r| r.starts_with("z_score")));
    assert!(reasons.iter().any(|r| r.starts_with("iqr")));
    assert!(reasons.iter().any(|r| r.starts_with("modified_z")));
    assert_eq!(result.score, 100.0);
}

#[test]
fn test_null_and_junk_never_share_a_cell() {
    let result = validate(&messy_export(300));

    let nulls: Vec<_> = result
        .issues_of_kind(DetectorKind::Null)
        .map(|i| (i.column.clone(), i.row))
        .collect();
    for junk in result.issues_of_kind(DetectorKind::Junk) {
        assert!(!nulls.contains(&(junk.column.clone(), junk.row)));
    }
    assert!(result.issues_of_kind(DetectorKind::Junk).count() >= 3);
    assert!(!nulls.is_empty());
}

#[test]
fn test_identifier_column_gets_null_checks_only() {
    let result = validate(&messy_export(300));
    let site: Vec<_> = result.issues_for_column("Site").collect();
    assert!(!site.is_empty());
    assert!(site.iter().all(|i| i.kind == DetectorKind::Null || i.kind == DetectorKind::Naming));
}

#[test]
fn test_issue_order_and_ids() {
    let result = validate(&messy_export(300));

    for pair in result.issues.windows(2) {
        assert!(pair[0].severity >= pair[1].severity);
    }
    for (i, issue) in result.issues.iter().enumerate() {
        assert_eq!(issue.id, format!("iss_{:05}", i + 1));
    }
    let total: usize = result.column_counts.values().map(|c| c.total()).sum();
    assert_eq!(total, result.issues.len());
    assert_eq!(result.totals.total(), result.issues.len());
}

// =============================================================================
// Scoring
// =============================================================================

#[test]
fn test_adding_an_issue_never_raises_the_score() {
    let baseline = validate(&messy_export(300));

    let worse = messy_export(300).replacen(
        &format!("{},{},", timestamp(10), steady(10)),
        &format!("{},FAULT,", timestamp(10)),
        1,
    );
    let worse = validate(&worse);

    assert_eq!(worse.totals.high, baseline.totals.high + 1);
    assert!(worse.score <= baseline.score);
    assert!(baseline.score < 100.0);
}

// =============================================================================
// Determinism and Load Strategies
// =============================================================================

#[test]
fn test_repeated_runs_are_identical() {
    let file = create_test_file(&messy_export(300), ".csv");
    let check = BmsCheck::new().unwrap();

    let a = serde_json::to_string(&check.validate_path(file.path()).unwrap()).unwrap();
    let b = serde_json::to_string(&check.validate_path(file.path()).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_chunked_matches_in_memory() {
    let file = create_test_file(&messy_export(500), ".csv");

    let in_memory = BmsCheck::with_config(ValidationConfig {
        chunk_rows: 64,
        ..Default::default()
    })
    .unwrap()
    .validate_path(file.path())
    .unwrap();

    let chunked = BmsCheck::with_config(ValidationConfig {
        chunk_rows: 64,
        large_file_threshold_mb: 0,
        ..Default::default()
    })
    .unwrap()
    .validate_path(file.path())
    .unwrap();

    assert_eq!(in_memory.metadata.strategy, LoadStrategy::InMemory);
    assert_eq!(chunked.metadata.strategy, LoadStrategy::Chunked);
    assert_eq!(in_memory.issues, chunked.issues);
    assert_eq!(in_memory.columns, chunked.columns);
    assert_eq!(in_memory.column_counts, chunked.column_counts);
    assert_eq!(in_memory.score, chunked.score);
    assert_eq!(in_memory.metadata.skipped_checks, chunked.metadata.skipped_checks);
    assert_eq!(in_memory.metadata.source.hash, chunked.metadata.source.hash);
    assert!(!chunked.metadata.approximate);
}

#[test]
fn test_small_reservoir_marks_result_approximate() {
    let file = create_test_file(&messy_export(400), ".csv");
    let result = BmsCheck::with_config(ValidationConfig {
        large_file_threshold_mb: 0,
        quantile_sample_size: 100,
        ..Default::default()
    })
    .unwrap()
    .validate_path(file.path())
    .unwrap();

    assert!(result.metadata.approximate);
    assert!(result
        .metadata
        .approximated_columns
        .contains(&"AHU1_SAT".to_string()));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_unsupported_format() {
    let file = create_test_file("PK\u{3}\u{4}", ".xlsx");
    let err = BmsCheck::new().unwrap().validate_path(file.path()).unwrap_err();
    assert!(matches!(err, BmsCheckError::UnsupportedFormat(_)));
}

#[test]
fn test_ragged_rows_are_corrupt() {
    let file = create_test_file("Timestamp,A,B\n2024-01-01 00:00,1,2\n2024-01-01 00:15,3\n", ".csv");
    let err = BmsCheck::new().unwrap().validate_path(file.path()).unwrap_err();
    assert!(matches!(err, BmsCheckError::CorruptFile { row: Some(1), .. }));
}

#[test]
fn test_empty_files() {
    for content in ["", "Timestamp,A\n"] {
        let file = create_test_file(content, ".csv");
        let err = BmsCheck::new().unwrap().validate_path(file.path()).unwrap_err();
        assert!(matches!(err, BmsCheckError::EmptyFile(_)), "{:?}", err);
    }
}

#[test]
fn test_invalid_config_fails_before_loading() {
    let config = ValidationConfig {
        null_run_medium: 20,
        null_run_high: 5,
        ..Default::default()
    };
    let err = BmsCheck::with_config(config).unwrap_err();
    assert!(matches!(err, BmsCheckError::Config(_)));
}

#[test]
fn test_cancellation() {
    let file = create_test_file(&messy_export(50), ".csv");
    let cancel = CancellationToken::new();
    let check = BmsCheck::new().unwrap().with_cancellation(cancel.clone());
    cancel.cancel();

    let err = check.validate_path(file.path()).unwrap_err();
    assert!(matches!(err, BmsCheckError::Cancelled));
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_save_and_load_result() {
    let result = validate(&messy_export(120));
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reports").join("trend.quality.json");

    result.save(&path).unwrap();
    let loaded = ValidationResult::load(&path).unwrap();

    assert_eq!(loaded.issues, result.issues);
    assert_eq!(loaded.totals, result.totals);
    assert_eq!(loaded.metadata.skipped_checks, result.metadata.skipped_checks);
    assert!((loaded.score - result.score).abs() < 1e-9);
}

#[test]
fn test_summary_mentions_every_tier_present() {
    let result = validate(&messy_export(300));
    let summary = result.render_summary();
    for severity in Severity::ALL {
        let present = result.totals.get(severity) > 0;
        assert_eq!(summary.contains(&format!("{} (", severity.label())), present);
    }
}

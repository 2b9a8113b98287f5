// NetSleuth - tests/e2e_pipeline.rs
//
// End-to-end tests for the capture -> snapshot -> filter -> page -> export path.
//
// These tests read real capture files from disk (UTF-8 fixture and a UTF-16LE
// copy written at test time), run the real refresh worker thread, and write
// real export files. No mocks, no stubs.

use netsleuth::app::collector::{CaptureSource, FileSource};
use netsleuth::app::refresh::RefreshManager;
use netsleuth::app::state::AppState;
use netsleuth::core::export::{self, ExportFormat};
use netsleuth::core::filter::{CategoryFilter, FilterState, SourceFilter};
use netsleuth::core::model::{AnomalyCategory, EventId, RefreshOutcome, RefreshProgress, RefreshStatus};
use netsleuth::core::pipeline;
use netsleuth::core::splitter::split_blocks;
use netsleuth::core::{classifier, dedup, parser};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

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

/// Capture and process a source synchronously.
fn outcome_of(source: &dyn CaptureSource) -> RefreshOutcome {
    pipeline::build_outcome(source.capture(), Instant::now())
}

/// Run one full refresh cycle through the worker thread into a fresh state.
fn refreshed_state(source: FileSource, page_size: usize, filter: FilterState) -> AppState {
    let manager = RefreshManager::new(Arc::new(source));
    let mut state = AppState::new(page_size);
    state.filter_state = filter;

    assert!(manager.request_refresh());
    loop {
        match manager.wait_progress(Duration::from_secs(10)) {
            Some(msg @ RefreshProgress::Completed { .. }) => {
                state.handle_progress(msg);
                break;
            }
            Some(msg) => state.handle_progress(msg),
            None => panic!("refresh did not complete within 10s"),
        }
    }
    assert!(!manager.is_busy());
    state
}

// =============================================================================
// Pipeline E2E
// =============================================================================

/// Preamble noise is dropped, the repeated failed logon is collapsed, and the
/// summary counts real events and anomalies.
#[test]
fn e2e_fixture_summary() {
    let outcome = outcome_of(&FileSource::path(fixture("security_capture.txt")));

    assert_eq!(outcome.entries.len(), 9);
    assert_eq!(
        outcome.summary.status,
        RefreshStatus::Fetched {
            total: 9,
            anomalies: 7
        }
    );
    assert!(outcome.summary.warnings.is_empty());
    assert_eq!(
        outcome.summary.status_line(),
        "Fetched 9 events. Detected 7 anomalies."
    );
}

/// Entries come out newest first.
#[test]
fn e2e_fixture_newest_first() {
    let outcome = outcome_of(&FileSource::path(fixture("security_capture.txt")));

    let ids: Vec<EventId> = outcome.entries.iter().map(|e| e.event_id).collect();
    let expected: Vec<EventId> = [4625, 4740, 4625, 1102, 7034, 1000, 1001, 4624, 6008]
        .into_iter()
        .map(EventId::Value)
        .collect();
    assert_eq!(ids, expected);

    let timestamps: Vec<&str> = outcome.entries.iter().map(|e| e.timestamp_display()).collect();
    let mut sorted = timestamps.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(timestamps, sorted);
}

/// Each fixture event lands in the expected category.
#[test]
fn e2e_fixture_classification() {
    let outcome = outcome_of(&FileSource::path(fixture("security_capture.txt")));

    let categories: Vec<AnomalyCategory> = outcome.entries.iter().map(|e| e.anomaly).collect();
    assert_eq!(
        categories,
        vec![
            AnomalyCategory::FailedLogin,
            AnomalyCategory::AccountLockout,
            AnomalyCategory::FailedLogin,
            AnomalyCategory::AuditLogCleared,
            // The Error level on 7034 is overridden by its identity rule.
            AnomalyCategory::ServiceCrash,
            AnomalyCategory::ErrorEvent,
            AnomalyCategory::None,
            AnomalyCategory::None,
            AnomalyCategory::UnexpectedShutdown,
        ]
    );
}

/// Address and account are mined only for allow-listed Security ids.
#[test]
fn e2e_fixture_security_details() {
    let outcome = outcome_of(&FileSource::path(fixture("security_capture.txt")));
    let e = &outcome.entries;

    // 11:00 failed logon: loopback normalised, Subject "-" skipped.
    assert_eq!(e[0].address_display(), "localhost");
    assert_eq!(e[0].account_display(), "svc_backup");

    // Lockout: the direct Account Name wins.
    assert_eq!(e[1].account_display(), "DC01$");
    assert_eq!(e[1].address_display(), "N/A");

    assert_eq!(e[2].address_display(), "10.0.0.5");
    assert_eq!(e[2].account_display(), "jdoe");

    // 1102 is classified but not mined.
    assert_eq!(e[3].account, None);

    // 4624 is neither classified nor mined.
    assert_eq!(e[7].source_address, None);
}

/// A UTF-16LE capture with BOM (Windows PowerShell `Out-File` default)
/// parses identically to the UTF-8 fixture.
#[test]
fn e2e_utf16_capture_matches_utf8() {
    let text = fs::read_to_string(fixture("security_capture.txt")).unwrap();
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.replace('\n', "\r\n").encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture_utf16.txt");
    fs::write(&path, bytes).unwrap();

    let utf8 = outcome_of(&FileSource::path(fixture("security_capture.txt")));
    let utf16 = outcome_of(&FileSource::path(&path));

    assert_eq!(utf16.summary.status, utf8.summary.status);
    let ids = |o: &RefreshOutcome| o.entries.iter().map(|e| e.event_id).collect::<Vec<_>>();
    assert_eq!(ids(&utf16), ids(&utf8));
    assert_eq!(utf16.entries[0].account_display(), "svc_backup");
}

/// An empty capture yields the informational entry and the NoEvents status.
#[test]
fn e2e_empty_capture_reports_no_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.txt");
    fs::write(&path, "\r\n\r\n").unwrap();

    let outcome = outcome_of(&FileSource::path(&path));
    assert_eq!(outcome.summary.status, RefreshStatus::NoEvents);
    assert_eq!(outcome.entries.len(), 1);
    assert_eq!(outcome.entries[0].event_id, EventId::Missing);
    assert_eq!(
        outcome.entries[0].message,
        "No relevant events found in the specified logs."
    );
}

/// An unreadable capture becomes a single synthetic error entry.
#[test]
fn e2e_missing_capture_is_synthetic_error() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = outcome_of(&FileSource::path(dir.path().join("nope.txt")));

    assert!(matches!(outcome.summary.status, RefreshStatus::Failed { .. }));
    assert_eq!(outcome.entries.len(), 1);
    assert!(outcome.entries[0]
        .message
        .starts_with("Error running collector: Cannot read capture"));
    assert!(!outcome.entries[0].is_real_event());
}

/// The same lockout reported by both collector passes, once followed by a
/// blank line and once at end of stream, survives as a single entry.
#[test]
fn e2e_duplicate_lockout_collapses_to_one() {
    let lockout = "TimeCreated      : 2024-03-05 10:20:00\n\
LogName          : Security\n\
Id               : 4740\n\
LevelDisplayName : Information\n\
Message          : A user account was locked out.\n\
                   \tAccount Name:\t\tjdoe";
    let text = format!("{lockout}\n\n{lockout}\n");

    let blocks: Vec<String> = split_blocks(text.lines()).collect();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0], blocks[1]);

    let mut entries = dedup::dedupe(blocks.iter().map(|b| parser::parse_block(b)));
    classifier::classify(&mut entries);

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event_id, EventId::Value(4740));
    assert_eq!(entries[0].anomaly, AnomalyCategory::AccountLockout);
    assert_eq!(entries[0].account_display(), "jdoe");

    // Same result through the full refresh path.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lockout.txt");
    fs::write(&path, &text).unwrap();
    let outcome = outcome_of(&FileSource::path(&path));
    assert_eq!(
        outcome.summary.status,
        RefreshStatus::Fetched {
            total: 1,
            anomalies: 1
        }
    );
}

/// A failing collector with partial output keeps its events and warns.
#[cfg(unix)]
#[test]
fn e2e_failing_command_with_output_keeps_events() {
    use netsleuth::app::collector::CommandSource;

    let script = format!(
        "cat '{}'; exit 3",
        fixture("security_capture.txt").display()
    );
    let source = CommandSource::new("sh", vec!["-c".to_string(), script]);
    let outcome = outcome_of(&source);

    assert_eq!(
        outcome.summary.status,
        RefreshStatus::Fetched {
            total: 9,
            anomalies: 7
        }
    );
    assert_eq!(outcome.summary.warnings.len(), 1);
    assert!(outcome.summary.status_line().contains("(potential errors)"));
}

/// A failing collector with no output is reported as a failure.
#[cfg(unix)]
#[test]
fn e2e_failing_command_without_output_fails() {
    use netsleuth::app::collector::CommandSource;

    let source = CommandSource::new("sh", vec!["-c".to_string(), "exit 1".to_string()]);
    let outcome = outcome_of(&source);

    match &outcome.summary.status {
        RefreshStatus::Failed { message } => {
            assert!(message.contains("failed (exit code 1)"), "{message}");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(outcome.entries.len(), 1);
}

// =============================================================================
// Refresh + state E2E
// =============================================================================

/// Filters set before the refresh are applied to the published snapshot.
#[test]
fn e2e_refresh_applies_filters() {
    let state = refreshed_state(
        FileSource::path(fixture("security_capture.txt")),
        100,
        FilterState {
            source: SourceFilter::Named("security".to_string()),
            category: CategoryFilter::AllAnomalies,
            text_search: String::new(),
        },
    );

    assert_eq!(state.filtered_indices.len(), 4);
    assert_eq!(state.total_pages, 1);
    assert_eq!(
        state.page_status(),
        "Showing 4 logs (4 anomalies) on page 1 of 1. Total matching: 4. \
         Filter: [Log: security | Anomaly: Show All Anomalies]"
    );
}

/// Text search runs over the raw block, so account names in the body match.
#[test]
fn e2e_text_search_over_raw_block() {
    let state = refreshed_state(
        FileSource::path(fixture("security_capture.txt")),
        100,
        FilterState {
            text_search: "JDOE".to_string(),
            ..Default::default()
        },
    );
    // The 10:15 failed logon and the lockout both name jdoe.
    assert_eq!(state.filtered_indices.len(), 2);
}

/// Small pages split the snapshot; out-of-range pages are rejected.
#[test]
fn e2e_pagination() {
    let mut state = refreshed_state(
        FileSource::path(fixture("security_capture.txt")),
        4,
        FilterState::default(),
    );

    assert_eq!(state.total_pages, 3);
    assert!(state.go_to_page(3).is_ok());
    assert_eq!(state.current_page_entries().len(), 1);
    assert!(state.go_to_page(4).is_err());
    assert_eq!(state.current_page, 3);

    state.set_filter(FilterState {
        category: CategoryFilter::from_label("Sec: Failed Login"),
        ..Default::default()
    });
    assert_eq!(state.current_page, 1);
    assert_eq!(state.total_pages, 1);
    assert_eq!(state.current_page_entries().len(), 2);
}

// =============================================================================
// Export E2E
// =============================================================================

/// CSV export of the current page round-trips through a CSV reader.
#[test]
fn e2e_export_csv_page() {
    let state = refreshed_state(
        FileSource::path(fixture("security_capture.txt")),
        100,
        FilterState::default(),
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.csv");
    let file = fs::File::create(&path).unwrap();
    let written =
        export::export_page(&state.current_page_entries(), ExportFormat::Csv, file, &path)
            .unwrap();
    assert_eq!(written, 9);

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "timestamp");
    assert_eq!(&headers[7], "message");

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 9);
    assert_eq!(&rows[0][1], "Security");
    assert_eq!(&rows[0][2], "4625");
    assert_eq!(&rows[0][4], "Sec: Failed Login");
    assert_eq!(&rows[0][5], "localhost");
    assert_eq!(&rows[0][6], "svc_backup");
    assert!(rows[0][7].contains("Account For Which Logon Failed"));
}

/// JSON export writes one object per entry with sentinel-filled fields.
#[test]
fn e2e_export_json_page() {
    let state = refreshed_state(
        FileSource::path(fixture("security_capture.txt")),
        100,
        FilterState {
            source: SourceFilter::Named("Application".to_string()),
            ..Default::default()
        },
    );

    let mut buf = Vec::new();
    let path = PathBuf::from("page.json");
    let written =
        export::export_page(&state.current_page_entries(), ExportFormat::Json, &mut buf, &path)
            .unwrap();
    assert_eq!(written, 2);

    let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["event_id"], 1000);
    assert_eq!(records[0]["anomaly"], "General: Error Event");
    assert_eq!(records[1]["account"], "N/A");
}

/// The rendered page text matches the one-line display format.
#[test]
fn e2e_page_text_format() {
    let state = refreshed_state(
        FileSource::path(fixture("security_capture.txt")),
        100,
        FilterState {
            source: SourceFilter::Named("System".to_string()),
            ..Default::default()
        },
    );

    let text = state.current_page_text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        "[2024-03-05 08:00:00] System ID:7034  Lvl:Error      | \
         The Print Spooler service terminated unexpectedly.  It has done this 1 time(s)."
    );
}

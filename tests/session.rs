mod common;

use aideon_consolidator::ConsolidateError;
use aideon_consolidator::model::{FileState, InputFile};
use aideon_consolidator::session::Session;
use aideon_consolidator::strategy::{ColumnSelection, Strategy};
use common::{csv_file, numbered_rows, xlsx_file};
use std::fs;
use tempfile::tempdir;

#[test]
fn run_updates_every_entry() {
    let mut session = Session::new();
    let first = session.add_file(xlsx_file(
        "first.xlsx",
        &[("A", numbered_rows("A", 3)), ("B", numbered_rows("B", 1))],
    ));
    let second = session.add_file(csv_file("second.csv", "1,2\n3,4\n"));

    let summary = session
        .run(&Strategy::Positional)
        .expect("run succeeds")
        .summary;
    assert_eq!(summary.total_rows, 6);
    assert_eq!(summary.total_files, 2);

    let first = session.entry(first).expect("first entry");
    assert_eq!(first.state, FileState::Completed);
    assert_eq!(first.row_count, Some(4));
    let second = session.entry(second).expect("second entry");
    assert_eq!(second.state, FileState::Completed);
    assert_eq!(second.row_count, Some(2));
    assert!(session.error().is_none());
    assert!(!session.is_running());
}

#[test]
fn adding_a_file_discards_the_result() {
    let mut session = Session::new();
    session.add_file(csv_file("a.csv", "1\n"));
    session.run(&Strategy::Positional).expect("run succeeds");
    assert!(session.result().is_some());

    session.add_file(csv_file("b.csv", "2\n"));
    assert!(session.result().is_none());
    assert_eq!(session.entries()[1].state, FileState::Pending);
    assert!(matches!(session.export(), Err(ConsolidateError::NoResult)));
}

#[test]
fn remove_and_clear_manage_the_queue() {
    let mut session = Session::new();
    let keep = session.add_file(csv_file("keep.csv", "1\n"));
    let drop = session.add_file(csv_file("drop.csv", "2\n"));

    assert!(session.remove_file(drop));
    assert!(!session.remove_file(drop));
    assert_eq!(session.entries().len(), 1);
    assert_eq!(session.entries()[0].id, keep);

    session.run(&Strategy::Positional).expect("run succeeds");
    session.clear();
    assert!(session.entries().is_empty());
    assert!(session.result().is_none());
}

#[test]
fn failed_run_records_error_and_marks_file() {
    let mut session = Session::new();
    let good = session.add_file(csv_file("good.csv", "1\n"));
    let bad = session.add_file(InputFile::new("bad.xlsx", b"garbage".to_vec()));
    let later = session.add_file(csv_file("later.csv", "2\n"));

    let error = session
        .run(&Strategy::Positional)
        .expect_err("run fails");
    assert!(matches!(error, ConsolidateError::Decode { .. }));

    assert_eq!(session.entry(good).map(|e| e.state), Some(FileState::Completed));
    assert_eq!(session.entry(bad).map(|e| e.state), Some(FileState::Error));
    assert_eq!(session.entry(later).map(|e| e.state), Some(FileState::Pending));
    assert!(session.result().is_none());
    assert!(session.error().is_some_and(|message| message.contains("bad.xlsx")));
}

#[test]
fn empty_run_reports_no_data() {
    let mut session = Session::new();
    session.add_file(csv_file("empty.csv", ""));

    let error = session
        .run(&Strategy::FixedColumns(ColumnSelection::default()))
        .expect_err("run fails");
    assert!(matches!(error, ConsolidateError::NoData));
    assert_eq!(session.error(), Some("no data found in the selected files"));
}

#[test]
fn export_failure_keeps_the_result() {
    let mut session = Session::new();
    let huge = "y".repeat(40_000);
    session.add_file(csv_file("huge.csv", &format!("{huge}\n")));
    session.run(&Strategy::Positional).expect("run succeeds");

    let error = session.export().expect_err("export fails");
    assert!(matches!(error, ConsolidateError::Serialization(_)));
    assert!(session.result().is_some());
    assert!(session.error().is_some());

    // A retry sees the same result.
    assert!(matches!(
        session.export(),
        Err(ConsolidateError::Serialization(_))
    ));
    assert_eq!(session.result().map(|result| result.summary.total_rows), Some(1));
}

#[test]
fn download_writes_timestamped_workbook() {
    let temp_dir = tempdir().expect("temporary directory");
    let input_path = temp_dir.path().join("input.csv");
    fs::write(&input_path, "Name,Age\nAnn,30\n").expect("input written");

    let mut session = Session::new();
    session.add_path(&input_path).expect("input queued");
    assert_eq!(session.entries()[0].name(), "input.csv");

    session.run(&Strategy::HeaderUnion).expect("run succeeds");
    let output_dir = temp_dir.path().join("out");
    let path = session.download(&output_dir).expect("download written");

    assert!(path.starts_with(&output_dir));
    let file_name = path.file_name().and_then(|name| name.to_str()).expect("name");
    assert!(file_name.starts_with("consolidated_records_"));
    assert!(fs::metadata(&path).expect("output exists").len() > 0);
}

#[test]
fn missing_input_is_reported() {
    let temp_dir = tempdir().expect("temporary directory");
    let mut session = Session::new();
    let error = session
        .add_path(&temp_dir.path().join("nope.xlsx"))
        .expect_err("missing file");
    assert!(matches!(error, ConsolidateError::MissingInput(_)));
}

#[test]
fn report_serialises_status_surface() {
    let mut session = Session::new();
    session.add_file(csv_file("a.csv", "1\n2\n"));
    session.run(&Strategy::Positional).expect("run succeeds");

    let json = serde_json::to_value(session.report()).expect("report serialised");
    assert_eq!(json["files"][0]["name"], "a.csv");
    assert_eq!(json["files"][0]["size"], 4);
    assert_eq!(json["files"][0]["state"], "completed");
    assert_eq!(json["files"][0]["row_count"], 2);
    assert_eq!(json["kind"], "positional");
    assert_eq!(json["summary"]["total_rows"], 2);
    assert!(json["error"].is_null());
    assert!(json["files"][0].get("bytes").is_none());
}

#[test]
fn report_has_no_kind_before_a_run() {
    let mut session = Session::new();
    session.add_file(csv_file("a.csv", "1\n"));

    let json = serde_json::to_value(session.report()).expect("report serialised");
    assert!(json["kind"].is_null());
    assert!(json["summary"].is_null());
}

#[test]
fn debug_output_omits_file_contents() {
    let mut session = Session::new();
    let id = session.add_file(InputFile::new("big.csv", vec![b'7'; 4096]));

    let rendered = format!("{:?}", session.entry(id).expect("entry"));
    assert!(rendered.contains("big.csv"));
    assert!(rendered.contains("4096"));
    assert!(!rendered.contains("55, 55"));
    assert!(rendered.len() < 512);
}

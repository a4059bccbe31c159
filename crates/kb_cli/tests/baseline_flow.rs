use std::fs;
use std::path::Path;

use kb_cli::{run_compare, run_snapshot, EngineError};
use kb_snapshot::TrendClass;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn delta_trend(outcome: &kb_cli::CompareOutcome, metric: &str) -> TrendClass {
    outcome
        .deltas
        .iter()
        .find(|d| d.metric == metric)
        .unwrap_or_else(|| panic!("no delta for {}", metric))
        .trend
}

#[test]
fn snapshot_then_compare_classifies_a_six_percent_shrink_as_improved() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    // 100_000 tokens, then 94_000 after trimming.
    write(root, "a/big.md", &"x".repeat(400_000));
    let snap = run_snapshot(root, None, "2026-08-01T00:00:00Z".to_string()).unwrap();
    assert_eq!(snap.snapshot.total_tokens, 100_000);
    assert!(snap.slot.ends_with(".kb/baseline.json"));

    write(root, "a/big.md", &"x".repeat(376_000));
    let outcome = run_compare(root, None, "2026-08-02T00:00:00Z".to_string()).unwrap();

    let tokens = outcome
        .deltas
        .iter()
        .find(|d| d.metric == "total_tokens")
        .unwrap();
    assert_eq!(tokens.baseline, 100_000);
    assert_eq!(tokens.current, 94_000);
    assert_eq!(tokens.pct_change, Some(-6.0));
    assert_eq!(tokens.trend, TrendClass::Improved);

    assert_eq!(delta_trend(&outcome, "total_files"), TrendClass::Stable);
    assert_eq!(delta_trend(&outcome, "large_files"), TrendClass::Stable);
    assert_eq!(outcome.baseline_timestamp, "2026-08-01T00:00:00Z");
    assert_eq!(outcome.baseline_sha256, snap.sha256);
}

#[test]
fn snapshot_slot_does_not_join_the_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "a/doc.md", "# D\n");

    let first = run_snapshot(root, None, "t1".to_string()).unwrap();
    // The slot lives under `.kb/`, which the scanner never descends into.
    let second = run_snapshot(root, None, "t2".to_string()).unwrap();
    assert_eq!(first.snapshot.total_files, second.snapshot.total_files);
}

#[test]
fn compare_without_a_baseline_is_an_engine_fault() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a/doc.md", "# D\n");

    let err = run_compare(dir.path(), None, "t".to_string()).unwrap_err();
    assert!(matches!(err, EngineError::Snapshot(_)));
}

#[test]
fn corrupted_baseline_is_an_engine_fault() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "a/doc.md", "# D\n");
    run_snapshot(root, None, "t".to_string()).unwrap();

    fs::write(root.join(".kb/baseline.json"), b"{ truncated").unwrap();
    let err = run_compare(root, None, "t2".to_string()).unwrap_err();
    assert!(matches!(err, EngineError::Snapshot(_)));
}

#[test]
fn explicit_slot_path_is_respected() {
    let dir = tempfile::tempdir().unwrap();
    let slot_dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let slot = slot_dir.path().join("custom-baseline.json");
    write(root, "a/doc.md", "# D\n");

    let snap = run_snapshot(root, Some(&slot), "t".to_string()).unwrap();
    assert_eq!(snap.slot, slot);
    assert!(slot.is_file());

    let outcome = run_compare(root, Some(&slot), "t2".to_string()).unwrap();
    assert_eq!(delta_trend(&outcome, "total_tokens"), TrendClass::Stable);
}

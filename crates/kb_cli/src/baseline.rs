use std::path::{Path, PathBuf};

use kb_scan::scan_corpus;
use kb_snapshot::{
    collect_snapshot, compute_deltas, default_slot_path, load_snapshot_with_hash, save_snapshot,
    Delta, Snapshot,
};

use crate::EngineError;

#[derive(Debug, Clone)]
pub struct SnapshotOutcome {
    pub snapshot: Snapshot,
    /// sha256 of the canonical bytes written to the slot.
    pub sha256: String,
    pub slot: PathBuf,
}

/// Scan the corpus and persist its aggregates into the baseline slot,
/// replacing any prior baseline.
pub fn run_snapshot(
    root: &Path,
    slot: Option<&Path>,
    timestamp: String,
) -> Result<SnapshotOutcome, EngineError> {
    let corpus = scan_corpus(root)?;
    let snapshot = collect_snapshot(&corpus, timestamp);
    let slot = slot
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_slot_path(&corpus.root));
    let sha256 = save_snapshot(&slot, &snapshot)?;
    Ok(SnapshotOutcome {
        snapshot,
        sha256,
        slot,
    })
}

#[derive(Debug, Clone)]
pub struct CompareOutcome {
    pub baseline_timestamp: String,
    pub baseline_sha256: String,
    pub current: Snapshot,
    pub deltas: Vec<Delta>,
}

/// Scan the corpus and compute per-metric deltas against the persisted
/// baseline. Purely advisory trend data; never part of a verdict.
pub fn run_compare(
    root: &Path,
    slot: Option<&Path>,
    timestamp: String,
) -> Result<CompareOutcome, EngineError> {
    let corpus = scan_corpus(root)?;
    let slot = slot
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_slot_path(&corpus.root));
    let baseline = load_snapshot_with_hash(&slot)?;
    let current = collect_snapshot(&corpus, timestamp);
    let deltas = compute_deltas(&baseline.snapshot, &current);
    Ok(CompareOutcome {
        baseline_timestamp: baseline.snapshot.timestamp.clone(),
        baseline_sha256: baseline.sha256,
        current,
        deltas,
    })
}

//! Invocation surface of the knowledge-base quality gate.
//!
//! Three operations: `check` (scan + rules + verdict), `snapshot` (persist
//! the single baseline slot), and `compare` (deltas against that baseline).
//! Content violations flow out as issues inside a successful outcome;
//! everything returned as [`EngineError`] maps to exit status 3.

pub mod baseline;
pub mod check;

pub use baseline::{run_compare, run_snapshot, CompareOutcome, SnapshotOutcome};
pub use check::{run_check, CheckOptions, CheckOutcome};

use std::fmt;

use kb_scan::ScanError;
use kb_snapshot::SnapshotError;

/// A fault in the engine itself, as opposed to a finding about the corpus.
/// Aborts the run and surfaces as exit status 3.
#[derive(Debug)]
pub enum EngineError {
    Scan(ScanError),
    Snapshot(SnapshotError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Scan(err) => write!(f, "engine fault: {}", err),
            EngineError::Snapshot(err) => write!(f, "engine fault: {}", err),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<ScanError> for EngineError {
    fn from(err: ScanError) -> Self {
        EngineError::Scan(err)
    }
}

impl From<SnapshotError> for EngineError {
    fn from(err: SnapshotError) -> Self {
        EngineError::Snapshot(err)
    }
}

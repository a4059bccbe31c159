//! Core vocabulary for the knowledge-base quality gate: severities, issues,
//! verdicts, and the exit-status contract consumed by automation.

pub mod issue;
pub mod status;
pub mod verdict;

pub use issue::{Issue, Severity};
pub use status::{exit_code, EXIT_ENGINE_FAULT, EXIT_FAIL, EXIT_PASS, EXIT_WARN};
pub use verdict::{reduce_issues, summarize, CheckSummary, Verdict};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::issue::{Issue, Severity};

/// Overall result of one validation run: the maximum severity across all
/// issues, with an empty issue set reducing to `Pass`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Warn => "warn",
            Verdict::Fail => "fail",
        }
    }
}

/// Reduce an issue list to a verdict, imposing the deterministic output
/// ordering at the same boundary.
///
/// Rules may emit in any order (the per-document fan-out is parallel), so
/// ordering is established here, once: by file, then rule id, then message.
pub fn reduce_issues(issues: &mut Vec<Issue>) -> Verdict {
    issues.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then_with(|| a.rule_id.cmp(&b.rule_id))
            .then_with(|| a.message.cmp(&b.message))
    });

    let mut verdict = Verdict::Pass;
    for issue in issues.iter() {
        match issue.severity {
            Severity::Fail => return Verdict::Fail,
            Severity::Warn => verdict = Verdict::Warn,
        }
    }
    verdict
}

/// Per-run counts reported next to the issue list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub total_files: u64,
    pub fail_count: u64,
    pub warn_count: u64,
    /// Files without any fail-severity issue.
    pub pass_count: u64,
}

pub fn summarize(issues: &[Issue], total_files: u64) -> CheckSummary {
    let mut files_with_fails: BTreeSet<&str> = BTreeSet::new();
    let mut fail_count = 0u64;
    let mut warn_count = 0u64;

    for issue in issues {
        match issue.severity {
            Severity::Fail => {
                fail_count += 1;
                files_with_fails.insert(issue.file.as_str());
            }
            Severity::Warn => warn_count += 1,
        }
    }

    CheckSummary {
        total_files,
        fail_count,
        warn_count,
        pass_count: total_files.saturating_sub(files_with_fails.len() as u64),
    }
}

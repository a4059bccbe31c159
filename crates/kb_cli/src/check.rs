use std::path::Path;

use chrono::NaiveDate;

use kb_core::{exit_code, reduce_issues, summarize, CheckSummary, Issue, Verdict};
use kb_rules::{evaluate, RuleOptions, FAST_SKIPPED_RULES};
use kb_scan::{scan_corpus, CrossRefIndex};

use crate::EngineError;

#[derive(Debug, Clone, Copy)]
pub struct CheckOptions {
    pub fast: bool,
    /// Reference date for freshness checks.
    pub today: NaiveDate,
}

impl CheckOptions {
    pub fn for_today() -> CheckOptions {
        CheckOptions {
            fast: false,
            today: chrono::Utc::now().date_naive(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// All issues, in reducer order (file, rule, message).
    pub issues: Vec<Issue>,
    pub verdict: Verdict,
    pub summary: CheckSummary,
    pub exit_code: i32,
    /// Rule ids that did not run (non-empty only in fast mode).
    pub skipped_rules: Vec<String>,
}

/// Run one full validation pass: scan, index, rules, reduce.
///
/// The index is built completely before any index-consuming rule runs; the
/// whole run is all-or-nothing (a scan fault yields `Err`, never a partial
/// verdict).
pub fn run_check(root: &Path, options: &CheckOptions) -> Result<CheckOutcome, EngineError> {
    let corpus = scan_corpus(root)?;
    let index = CrossRefIndex::from_corpus(&corpus);

    let mut issues = corpus.scan_issues.clone();
    issues.extend(evaluate(
        &corpus,
        &index,
        &RuleOptions {
            fast: options.fast,
            today: options.today,
        },
    ));

    let verdict = reduce_issues(&mut issues);
    let summary = summarize(&issues, corpus.documents.len() as u64);
    let skipped_rules = if options.fast {
        FAST_SKIPPED_RULES.iter().map(|r| r.to_string()).collect()
    } else {
        Vec::new()
    };

    Ok(CheckOutcome {
        issues,
        verdict,
        summary,
        exit_code: exit_code(verdict),
        skipped_rules,
    })
}

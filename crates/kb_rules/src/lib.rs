//! The fixed rule set of the knowledge-base quality gate.
//!
//! Every rule is a pure function over one document (plus the shared
//! cross-reference index, or the whole corpus for structural rules) that
//! returns zero or more issues. No rule consults another rule's output, and
//! running the set twice over an unchanged corpus yields the same issue
//! multiset.

pub mod corpus_rules;
pub mod document_rules;
pub mod readability;

use chrono::NaiveDate;
use rayon::prelude::*;

use kb_core::Issue;
use kb_scan::{Corpus, CrossRefIndex};

pub use corpus_rules::{
    coverage, index_sync, link_resolution, orphans, RULE_COVERAGE_COMPANION,
    RULE_COVERAGE_OVERVIEW, RULE_INDEX_SYNC, RULE_LINK_RESOLUTION, RULE_ORPHAN,
};
pub use document_rules::{
    freshness, heading_hierarchy, metadata_completeness, section_completeness, section_ordering,
    size_bounds, source_url_format, MAX_CONTENT_AGE_DAYS, RULE_FRESHNESS,
    RULE_HEADING_HIERARCHY, RULE_METADATA_COMPLETENESS, RULE_SECTION_COMPLETENESS,
    RULE_SECTION_ORDERING, RULE_SIZE_BOUNDS, RULE_SOURCE_URL,
};
pub use readability::{readability, RULE_READABILITY};

#[derive(Debug, Clone, Copy)]
pub struct RuleOptions {
    /// Fast mode trades completeness for latency: only per-document rules
    /// that need no corpus index run. The skipped set is
    /// [`FAST_SKIPPED_RULES`], a declared constant rather than an ad-hoc
    /// branch.
    pub fast: bool,
    /// Reference date for freshness checks, injected by the caller so the
    /// rules themselves never read the clock.
    pub today: NaiveDate,
}

/// Rules that fast mode skips because they require the full corpus index.
pub const FAST_SKIPPED_RULES: &[&str] = &[
    RULE_LINK_RESOLUTION,
    RULE_ORPHAN,
    RULE_COVERAGE_OVERVIEW,
    RULE_COVERAGE_COMPANION,
    RULE_INDEX_SYNC,
];

/// Run the rule set over a scanned corpus.
///
/// The index must be fully built before this is called; per-document
/// validation then fans out in parallel and results merge by concatenation.
/// Ordering is imposed later, at the reducer.
pub fn evaluate(corpus: &Corpus, index: &CrossRefIndex, options: &RuleOptions) -> Vec<Issue> {
    let today = options.today;

    let mut issues: Vec<Issue> = corpus
        .documents
        .par_iter()
        .flat_map(|doc| {
            let mut out = Vec::new();
            out.extend(metadata_completeness(doc));
            out.extend(source_url_format(doc));
            out.extend(freshness(doc, today));
            out.extend(section_ordering(doc));
            out.extend(size_bounds(doc));
            out.extend(section_completeness(doc));
            out.extend(heading_hierarchy(doc));
            out.extend(readability(doc));
            if !options.fast {
                out.extend(link_resolution(doc, index));
            }
            out
        })
        .collect();

    if !options.fast {
        issues.extend(orphans(corpus, index));
        issues.extend(coverage(corpus));
        issues.extend(index_sync(corpus));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::PathBuf;

    use kb_scan::parse_document;

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()
    }

    fn corpus_from(files: &[(&str, &str)]) -> Corpus {
        let root = PathBuf::from("/kb");
        let mut rels: Vec<(&str, &str)> = files.to_vec();
        rels.sort_by(|a, b| a.0.cmp(b.0));
        let documents: Vec<_> = rels
            .iter()
            .map(|(rel, content)| parse_document(&root, rel, content))
            .collect();
        let mut areas: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, doc) in documents.iter().enumerate() {
            if let Some(area) = doc.area.clone() {
                areas.entry(area).or_default().push(idx);
            }
        }
        let all_files: BTreeSet<String> =
            rels.iter().map(|(rel, _)| rel.to_string()).collect();
        Corpus {
            root,
            documents,
            areas,
            all_files,
            scan_issues: Vec::new(),
        }
    }

    #[test]
    fn fast_mode_skips_index_dependent_rules() {
        // `topic.md` has a broken link, no companion, and no area overview:
        // three findings in full mode, none of them in fast mode.
        let corpus = corpus_from(&[(
            "alpha/topic.md",
            "---\ndepth: reference\nrelevance: r\nlast_validated: 2026-07-20\nsources:\n  - https://example.com\n---\n# T\nSee [gone](missing.md).\n",
        )]);
        let index = CrossRefIndex::from_corpus(&corpus);

        let full = evaluate(
            &corpus,
            &index,
            &RuleOptions {
                fast: false,
                today: fixed_today(),
            },
        );
        let fast = evaluate(
            &corpus,
            &index,
            &RuleOptions {
                fast: true,
                today: fixed_today(),
            },
        );

        assert!(full
            .iter()
            .any(|i| FAST_SKIPPED_RULES.contains(&i.rule_id.as_str())));
        assert!(fast
            .iter()
            .all(|i| !FAST_SKIPPED_RULES.contains(&i.rule_id.as_str())));
    }

    #[test]
    fn evaluate_is_idempotent() {
        let corpus = corpus_from(&[
            ("alpha/overview.md", "# A\n"),
            ("alpha/topic.md", "---\ndepth: working\n---\n# T\n"),
        ]);
        let index = CrossRefIndex::from_corpus(&corpus);
        let options = RuleOptions {
            fast: false,
            today: fixed_today(),
        };

        let mut first = evaluate(&corpus, &index, &options);
        let mut second = evaluate(&corpus, &index, &options);
        let verdict_a = kb_core::reduce_issues(&mut first);
        let verdict_b = kb_core::reduce_issues(&mut second);
        assert_eq!(first, second);
        assert_eq!(verdict_a, verdict_b);
    }
}

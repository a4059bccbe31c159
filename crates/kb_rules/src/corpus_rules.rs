use std::collections::BTreeSet;

use kb_core::{Issue, Severity};
use kb_scan::{Corpus, CrossRefIndex, Document, LinkKind};

pub const RULE_LINK_RESOLUTION: &str = "links/resolution";
pub const RULE_ORPHAN: &str = "links/orphan";
pub const RULE_COVERAGE_OVERVIEW: &str = "coverage/overview";
pub const RULE_COVERAGE_COMPANION: &str = "coverage/reference-companion";
pub const RULE_INDEX_SYNC: &str = "coverage/index-sync";

const OVERVIEW_FILE: &str = "overview.md";
const INDEX_FILE: &str = "index.md";

/// Documents that are navigation entry points and therefore never orphans.
const ENTRY_FILES: &[&str] = &[OVERVIEW_FILE, INDEX_FILE];

/// Every internal link must resolve against the index built for this scan.
/// External, anchor, and mail links are exempt.
pub fn link_resolution(doc: &Document, index: &CrossRefIndex) -> Vec<Issue> {
    let mut issues = Vec::new();
    for link in &doc.links {
        if link.kind != LinkKind::Internal {
            continue;
        }
        let target_path = link.target_path();
        if target_path.is_empty() {
            continue;
        }
        if index.resolve(&doc.rel_path, target_path).is_none() {
            issues.push(Issue::new(
                RULE_LINK_RESOLUTION,
                Severity::Warn,
                doc.display_path.clone(),
                format!("Broken internal link: {}", target_path),
            ));
        }
    }
    issues
}

/// A document no other document links to is unreachable from the corpus
/// navigation; entry points are exempt.
pub fn orphans(corpus: &Corpus, index: &CrossRefIndex) -> Vec<Issue> {
    let mut linked: BTreeSet<String> = BTreeSet::new();
    for doc in &corpus.documents {
        for link in &doc.links {
            if link.kind != LinkKind::Internal {
                continue;
            }
            let target_path = link.target_path();
            if target_path.is_empty() {
                continue;
            }
            if let Some(resolved) = index.resolve(&doc.rel_path, target_path) {
                linked.insert(resolved);
            }
        }
    }

    let mut issues = Vec::new();
    for doc in &corpus.documents {
        if ENTRY_FILES.contains(&doc.file_name.as_str()) {
            continue;
        }
        if !linked.contains(&doc.rel_path) {
            issues.push(Issue::new(
                RULE_ORPHAN,
                Severity::Warn,
                doc.display_path.clone(),
                format!(
                    "Orphaned file; not linked from any other document: {}",
                    doc.rel_path
                ),
            ));
        }
    }
    issues
}

/// Structural coverage: every area needs its `overview.md` (fail), and
/// every topic document needs a reference companion (warn).
pub fn coverage(corpus: &Corpus) -> Vec<Issue> {
    let mut issues = Vec::new();

    for (area, members) in &corpus.areas {
        let overview_rel = format!("{}/{}", area, OVERVIEW_FILE);
        if !corpus.all_files.contains(&overview_rel) {
            issues.push(Issue::new(
                RULE_COVERAGE_OVERVIEW,
                Severity::Fail,
                corpus.area_display_path(area),
                format!("Area '{}' missing {}", area, OVERVIEW_FILE),
            ));
        }

        for &idx in members {
            let doc = &corpus.documents[idx];
            if !is_area_topic(doc) {
                continue;
            }
            let stem = doc.file_name.trim_end_matches(".md");
            let companion_rel = format!("{}/{}.ref.md", area, stem);
            if !corpus.all_files.contains(&companion_rel) {
                issues.push(Issue::new(
                    RULE_COVERAGE_COMPANION,
                    Severity::Warn,
                    doc.display_path.clone(),
                    format!(
                        "Topic '{}' missing companion {}.ref.md",
                        doc.file_name, stem
                    ),
                ));
            }
        }
    }

    issues
}

/// Root `index.md` must exist and mention every topic document.
pub fn index_sync(corpus: &Corpus) -> Vec<Issue> {
    let Some(index_doc) = corpus.document_by_rel_path(INDEX_FILE) else {
        return vec![Issue::new(
            RULE_INDEX_SYNC,
            Severity::Warn,
            corpus.root.join(INDEX_FILE).display().to_string(),
            "Missing index.md at corpus root".to_string(),
        )];
    };

    let mut issues = Vec::new();
    for doc in &corpus.documents {
        if !is_area_topic(doc) {
            continue;
        }
        if !index_doc.body.contains(doc.rel_path.as_str()) {
            issues.push(Issue::new(
                RULE_INDEX_SYNC,
                Severity::Warn,
                doc.display_path.clone(),
                format!("Topic not listed in index.md: {}", doc.rel_path),
            ));
        }
    }
    issues
}

/// A topic is a document directly inside an area directory that is neither
/// the area overview, a reference companion, nor an index.
fn is_area_topic(doc: &Document) -> bool {
    doc.area.is_some()
        && doc.rel_path.matches('/').count() == 1
        && doc.file_name != OVERVIEW_FILE
        && doc.file_name != INDEX_FILE
        && !doc.is_reference_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use kb_scan::parse_document;

    fn corpus_from(files: &[(&str, &str)]) -> Corpus {
        let root = PathBuf::from("/kb");
        let mut rels: Vec<(&str, &str)> = files.to_vec();
        rels.sort_by(|a, b| a.0.cmp(b.0));
        let documents: Vec<Document> = rels
            .iter()
            .map(|(rel, content)| parse_document(&root, rel, content))
            .collect();
        let mut areas: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, doc) in documents.iter().enumerate() {
            if let Some(area) = doc.area.clone() {
                areas.entry(area).or_default().push(idx);
            }
        }
        Corpus {
            root,
            documents,
            areas,
            all_files: rels.iter().map(|(rel, _)| rel.to_string()).collect(),
            scan_issues: Vec::new(),
        }
    }

    #[test]
    fn broken_internal_link_produces_one_warn() {
        let corpus = corpus_from(&[("a/t.md", "# T\n[x](missing.md)\n")]);
        let index = CrossRefIndex::from_corpus(&corpus);
        let issues = link_resolution(&corpus.documents[0], &index);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warn);
        assert!(issues[0].message.contains("missing.md"));
    }

    #[test]
    fn external_and_anchor_links_exempt() {
        let corpus = corpus_from(&[(
            "a/t.md",
            "# T\n[x](http://example.com)\n[y](#section)\n[z](mailto:kb@example.com)\n",
        )]);
        let index = CrossRefIndex::from_corpus(&corpus);
        assert!(link_resolution(&corpus.documents[0], &index).is_empty());
    }

    #[test]
    fn resolvable_link_with_fragment_passes() {
        let corpus = corpus_from(&[
            ("a/t.md", "# T\n[x](other.md#setup)\n"),
            ("a/other.md", "# O\n## Setup\n"),
        ]);
        let index = CrossRefIndex::from_corpus(&corpus);
        let doc = corpus.document_by_rel_path("a/t.md").unwrap();
        assert!(link_resolution(doc, &index).is_empty());
    }

    #[test]
    fn unlinked_topic_is_an_orphan_but_entry_points_are_not() {
        let corpus = corpus_from(&[
            ("a/overview.md", "# A\n"),
            ("a/floating.md", "# F\n"),
            ("index.md", "# Index\n"),
        ]);
        let index = CrossRefIndex::from_corpus(&corpus);
        let issues = orphans(&corpus, &index);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("a/floating.md"));
    }

    #[test]
    fn linked_topic_is_not_an_orphan() {
        let corpus = corpus_from(&[
            ("a/overview.md", "# A\n[topic](topic.md)\n"),
            ("a/topic.md", "# T\n"),
        ]);
        let index = CrossRefIndex::from_corpus(&corpus);
        assert!(orphans(&corpus, &index).is_empty());
    }

    #[test]
    fn missing_overview_is_a_fail_naming_the_area() {
        let corpus = corpus_from(&[("a/topic.md", "# T\n"), ("a/topic.ref.md", "# R\n")]);
        let issues = coverage(&corpus);
        let fails: Vec<&Issue> = issues
            .iter()
            .filter(|i| i.rule_id == RULE_COVERAGE_OVERVIEW)
            .collect();
        assert_eq!(fails.len(), 1);
        assert_eq!(fails[0].severity, Severity::Fail);
        assert!(fails[0].message.contains("'a'"));
    }

    #[test]
    fn adding_overview_clears_the_coverage_fail() {
        let corpus = corpus_from(&[
            ("a/overview.md", "# A\n"),
            ("a/topic.md", "# T\n"),
            ("a/topic.ref.md", "# R\n"),
        ]);
        assert!(coverage(&corpus)
            .iter()
            .all(|i| i.rule_id != RULE_COVERAGE_OVERVIEW));
    }

    #[test]
    fn topic_without_companion_is_a_warn() {
        let corpus = corpus_from(&[("a/overview.md", "# A\n"), ("a/bidding.md", "# B\n")]);
        let issues = coverage(&corpus);
        let warns: Vec<&Issue> = issues
            .iter()
            .filter(|i| i.rule_id == RULE_COVERAGE_COMPANION)
            .collect();
        assert_eq!(warns.len(), 1);
        assert!(warns[0].message.contains("bidding.ref.md"));
    }

    #[test]
    fn reference_files_need_no_companion() {
        let corpus = corpus_from(&[
            ("a/overview.md", "# A\n"),
            ("a/bidding.md", "# B\n"),
            ("a/bidding.ref.md", "# R\n"),
        ]);
        assert!(coverage(&corpus)
            .iter()
            .all(|i| i.rule_id != RULE_COVERAGE_COMPANION));
    }

    #[test]
    fn nested_documents_are_not_companion_checked() {
        let corpus = corpus_from(&[
            ("a/overview.md", "# A\n"),
            ("a/deep/notes.md", "# N\n"),
        ]);
        assert!(coverage(&corpus)
            .iter()
            .all(|i| i.rule_id != RULE_COVERAGE_COMPANION));
    }

    #[test]
    fn missing_index_is_flagged_once() {
        let corpus = corpus_from(&[("a/overview.md", "# A\n")]);
        let issues = index_sync(&corpus);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Missing index.md"));
    }

    #[test]
    fn unlisted_topic_is_flagged() {
        let corpus = corpus_from(&[
            ("index.md", "# Index\n- [b](a/bidding.md)\n"),
            ("a/overview.md", "# A\n"),
            ("a/bidding.md", "# B\n"),
            ("a/settlement.md", "# S\n"),
        ]);
        let issues = index_sync(&corpus);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("a/settlement.md"));
    }
}

use std::collections::BTreeSet;

use crate::scanner::Corpus;

/// Lexically join a relative link target onto the directory of its source
/// document. Returns `None` when the target escapes the corpus root.
///
/// Resolution is path-set membership, never a live filesystem probe: the
/// index is built once, before any link rule runs.
pub fn normalize_join(source_rel: &str, target: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();

    // Leading `/` means corpus-root-relative; otherwise start from the
    // source document's directory.
    let target = if let Some(rooted) = target.strip_prefix('/') {
        rooted
    } else {
        if let Some((dir, _file)) = source_rel.rsplit_once('/') {
            parts.extend(dir.split('/'));
        }
        target
    };

    for piece in target.split('/') {
        match piece {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Path-existence lookup for link resolution, built once per scan.
///
/// Covers every file the walk saw (any extension), not just documents, so
/// links to non-document assets resolve correctly.
#[derive(Debug, Clone)]
pub struct CrossRefIndex {
    paths: BTreeSet<String>,
}

impl CrossRefIndex {
    pub fn from_corpus(corpus: &Corpus) -> CrossRefIndex {
        CrossRefIndex {
            paths: corpus.all_files.clone(),
        }
    }

    pub fn from_paths(paths: BTreeSet<String>) -> CrossRefIndex {
        CrossRefIndex { paths }
    }

    pub fn contains(&self, rel_path: &str) -> bool {
        self.paths.contains(rel_path)
    }

    /// Resolve a link target relative to its source document. `Some(path)`
    /// when the normalized target exists in the corpus, `None` otherwise.
    pub fn resolve(&self, source_rel: &str, target: &str) -> Option<String> {
        let normalized = normalize_join(source_rel, target)?;
        if self.paths.contains(&normalized) {
            Some(normalized)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(paths: &[&str]) -> CrossRefIndex {
        CrossRefIndex::from_paths(paths.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn sibling_target_resolves() {
        let idx = index(&["auctions/bidding.md", "auctions/overview.md"]);
        assert_eq!(
            idx.resolve("auctions/overview.md", "bidding.md").as_deref(),
            Some("auctions/bidding.md")
        );
    }

    #[test]
    fn parent_traversal_resolves() {
        let idx = index(&["auctions/bidding.md", "infra/setup.md"]);
        assert_eq!(
            idx.resolve("auctions/bidding.md", "../infra/setup.md")
                .as_deref(),
            Some("infra/setup.md")
        );
    }

    #[test]
    fn missing_target_does_not_resolve() {
        let idx = index(&["auctions/overview.md"]);
        assert!(idx.resolve("auctions/overview.md", "missing.md").is_none());
    }

    #[test]
    fn escape_above_root_does_not_resolve() {
        let idx = index(&["a.md"]);
        assert!(normalize_join("a.md", "../../x.md").is_none());
    }

    #[test]
    fn dot_segments_collapse() {
        assert_eq!(
            normalize_join("a/b.md", "./c/../d.md").as_deref(),
            Some("a/d.md")
        );
    }

    #[test]
    fn rooted_target_resolves_from_corpus_root() {
        let idx = index(&["infra/setup.md"]);
        assert_eq!(
            idx.resolve("auctions/bidding.md", "/infra/setup.md")
                .as_deref(),
            Some("infra/setup.md")
        );
    }
}

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use kb_core::{Issue, Severity};

use crate::document::{parse_document, Document};

/// Filesystem-level failure that aborts the whole run (exit status 3).
/// Content problems inside the corpus never take this path; they become
/// issues and the scan continues.
#[derive(Debug)]
pub enum ScanError {
    BadRoot(String),
    Io(String),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::BadRoot(err) => write!(f, "bad scan root: {}", err),
            ScanError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for ScanError {}

/// Directory names never descended into, on top of the `_`/`.` prefix rule.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &["node_modules", "archive", "target"];

const RULE_SCAN_UNREADABLE: &str = "scan/unreadable";

/// Everything one scan pass produced. Documents are indexed by position;
/// the area map and link rules refer to them by index, never by pointer.
#[derive(Debug)]
pub struct Corpus {
    pub root: PathBuf,
    /// All parsed documents, sorted by relative path.
    pub documents: Vec<Document>,
    /// Area name (top-level directory) to indices into `documents`.
    /// Doc-less area directories appear with an empty list so coverage can
    /// still flag them.
    pub areas: BTreeMap<String, Vec<usize>>,
    /// Every file the walk saw (any extension), corpus-relative.
    pub all_files: BTreeSet<String>,
    /// Unreadable-content findings raised during the walk.
    pub scan_issues: Vec<Issue>,
}

impl Corpus {
    pub fn area_display_path(&self, area: &str) -> String {
        self.root.join(area).display().to_string()
    }

    pub fn document_by_rel_path(&self, rel_path: &str) -> Option<&Document> {
        self.documents
            .binary_search_by(|d| d.rel_path.as_str().cmp(rel_path))
            .ok()
            .map(|idx| &self.documents[idx])
    }
}

fn reserved_name(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('.')
}

fn excluded_dir(name: &str) -> bool {
    reserved_name(name) || DEFAULT_EXCLUDED_DIRS.contains(&name)
}

/// Walk `root` and build the corpus.
///
/// The walk is an explicit-stack traversal with sorted output. A missing or
/// non-directory root is a `ScanError`; an unreadable file or subdirectory
/// is a fail issue naming that path, and the walk continues.
pub fn scan_corpus(root: &Path) -> Result<Corpus, ScanError> {
    let meta = fs::metadata(root)
        .map_err(|err| ScanError::BadRoot(format!("{}: {}", root.display(), err)))?;
    if !meta.is_dir() {
        return Err(ScanError::BadRoot(format!(
            "{}: not a directory",
            root.display()
        )));
    }
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

    let mut all_files: BTreeSet<String> = BTreeSet::new();
    let mut areas: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    let mut scan_issues: Vec<Issue> = Vec::new();
    let mut md_files: Vec<(String, String)> = Vec::new();

    let mut stack = vec![root.clone()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                if dir == root {
                    return Err(ScanError::Io(format!("{}: {}", dir.display(), err)));
                }
                scan_issues.push(Issue::new(
                    RULE_SCAN_UNREADABLE,
                    Severity::Fail,
                    dir.display().to_string(),
                    format!("Unreadable directory: {}", err),
                ));
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    scan_issues.push(Issue::new(
                        RULE_SCAN_UNREADABLE,
                        Severity::Fail,
                        dir.display().to_string(),
                        format!("Unreadable directory entry: {}", err),
                    ));
                    continue;
                }
            };
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(err) => {
                    scan_issues.push(Issue::new(
                        RULE_SCAN_UNREADABLE,
                        Severity::Fail,
                        path.display().to_string(),
                        format!("Unreadable entry type: {}", err),
                    ));
                    continue;
                }
            };

            if file_type.is_dir() {
                if excluded_dir(&name) {
                    continue;
                }
                if path.parent() == Some(root.as_path()) {
                    areas.entry(name).or_default();
                }
                stack.push(path);
                continue;
            }

            if !file_type.is_file() || reserved_name(&name) {
                continue;
            }

            let rel = match path.strip_prefix(&root) {
                Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };
            all_files.insert(rel.clone());

            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }

            match fs::read_to_string(&path) {
                Ok(content) => md_files.push((rel, content)),
                Err(err) => scan_issues.push(Issue::new(
                    RULE_SCAN_UNREADABLE,
                    Severity::Fail,
                    path.display().to_string(),
                    format!("Unreadable file: {}", err),
                )),
            }
        }
    }

    md_files.sort_by(|a, b| a.0.cmp(&b.0));
    let documents: Vec<Document> = md_files
        .iter()
        .map(|(rel, content)| parse_document(&root, rel, content))
        .collect();

    for (idx, doc) in documents.iter().enumerate() {
        if let Some(area) = doc.area.as_ref() {
            if let Some(members) = areas.get_mut(area) {
                members.push(idx);
            }
        }
    }

    Ok(Corpus {
        root,
        documents,
        areas,
        all_files,
        scan_issues,
    })
}

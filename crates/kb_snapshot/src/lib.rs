//! Point-in-time corpus aggregates and the single-slot baseline store.
//!
//! The store keeps exactly one baseline per slot path, overwritten on each
//! explicit save. Writes go to a temporary sibling file and are renamed
//! into place so a crash mid-write never leaves a corrupt baseline. Loads
//! hash the canonical JSON bytes, so callers can tell exactly which
//! baseline a comparison ran against.

pub mod delta;

pub use delta::{classify_trend, compute_deltas, Delta, TrendClass};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use kb_scan::Corpus;

pub const SNAPSHOT_SCHEMA_ID: &str = "kb-baseline/1";

/// Line count above which a document is tracked as a large file.
pub const LARGE_FILE_LINES: usize = 500;

/// How many documents `top_by_tokens` retains.
pub const TOP_FILES_LIMIT: usize = 20;

/// Token-distribution buckets: `[min, max)`, open-ended for the last.
const SIZE_BUCKETS: &[(usize, Option<usize>, &str)] = &[
    (0, Some(500), "<500 tokens"),
    (500, Some(2000), "500-2000 tokens"),
    (2000, Some(5000), "2000-5000 tokens"),
    (5000, None, ">5000 tokens"),
];

#[derive(Debug)]
pub enum SnapshotError {
    Io(String),
    Json(String),
    Canonical(String),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Io(err) => write!(f, "io error: {}", err),
            SnapshotError::Json(err) => write!(f, "json error: {}", err),
            SnapshotError::Canonical(err) => write!(f, "canonical json error: {}", err),
        }
    }
}

impl std::error::Error for SnapshotError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeFile {
    pub path: String,
    pub lines: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopFile {
    pub path: String,
    pub tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_id: String,
    pub timestamp: String,
    pub root: String,
    pub total_files: u64,
    pub total_tokens: u64,
    pub total_lines: u64,
    pub total_bytes: u64,
    pub size_buckets: BTreeMap<String, u64>,
    pub large_files: Vec<LargeFile>,
    pub top_by_tokens: Vec<TopFile>,
}

#[derive(Debug, Clone)]
pub struct SnapshotWithHash {
    pub snapshot: Snapshot,
    pub sha256: String,
}

/// Build a snapshot from one scan's aggregates. The timestamp is supplied
/// by the caller so this stays deterministic under test.
pub fn collect_snapshot(corpus: &Corpus, timestamp: String) -> Snapshot {
    let mut total_tokens = 0u64;
    let mut total_lines = 0u64;
    let mut total_bytes = 0u64;
    let mut size_buckets: BTreeMap<String, u64> = SIZE_BUCKETS
        .iter()
        .map(|(_, _, label)| (label.to_string(), 0))
        .collect();
    let mut large_files = Vec::new();

    for doc in &corpus.documents {
        total_tokens += doc.approx_tokens as u64;
        total_lines += doc.line_count as u64;
        total_bytes += doc.byte_count;

        for (min, max, label) in SIZE_BUCKETS {
            let in_bucket = match max {
                Some(max) => doc.approx_tokens >= *min && doc.approx_tokens < *max,
                None => doc.approx_tokens >= *min,
            };
            if in_bucket {
                if let Some(count) = size_buckets.get_mut(*label) {
                    *count += 1;
                }
                break;
            }
        }

        if doc.line_count > LARGE_FILE_LINES {
            large_files.push(LargeFile {
                path: doc.rel_path.clone(),
                lines: doc.line_count as u64,
            });
        }
    }

    let mut by_tokens: Vec<TopFile> = corpus
        .documents
        .iter()
        .map(|doc| TopFile {
            path: doc.rel_path.clone(),
            tokens: doc.approx_tokens as u64,
        })
        .collect();
    by_tokens.sort_by(|a, b| b.tokens.cmp(&a.tokens).then_with(|| a.path.cmp(&b.path)));
    by_tokens.truncate(TOP_FILES_LIMIT);

    Snapshot {
        schema_id: SNAPSHOT_SCHEMA_ID.to_string(),
        timestamp,
        root: corpus.root.display().to_string(),
        total_files: corpus.documents.len() as u64,
        total_tokens,
        total_lines,
        total_bytes,
        size_buckets,
        large_files,
        top_by_tokens: by_tokens,
    }
}

/// The well-known single baseline slot under a corpus root.
pub fn default_slot_path(root: &Path) -> PathBuf {
    root.join(".kb").join("baseline.json")
}

/// Persist `snapshot` into the slot at `path`, replacing any prior
/// baseline. Returns the sha256 of the canonical bytes written.
///
/// The write is atomic: content goes to a `.tmp` sibling first, then a
/// rename replaces the slot.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<String, SnapshotError> {
    let value =
        serde_json::to_value(snapshot).map_err(|err| SnapshotError::Json(err.to_string()))?;
    let bytes = canonical_json_bytes(&value)?;
    let sha256 = sha256_hex(&bytes);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            SnapshotError::Io(format!("create {}: {}", parent.display(), err))
        })?;
    }

    let Some(file_name) = path.file_name() else {
        return Err(SnapshotError::Io(format!(
            "invalid slot path: {}",
            path.display()
        )));
    };
    let tmp = path.with_file_name(format!("{}.tmp", file_name.to_string_lossy()));

    fs::write(&tmp, &bytes)
        .map_err(|err| SnapshotError::Io(format!("write {}: {}", tmp.display(), err)))?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(SnapshotError::Io(format!(
            "replace {}: {}",
            path.display(),
            err
        )));
    }

    Ok(sha256)
}

/// Load the baseline at `path` along with the sha256 of its canonical
/// bytes. A missing, unreadable, or malformed slot is an error; callers
/// surface it as an engine fault, never as a content issue.
pub fn load_snapshot_with_hash(path: &Path) -> Result<SnapshotWithHash, SnapshotError> {
    let bytes = fs::read(path)
        .map_err(|err| SnapshotError::Io(format!("read {}: {}", path.display(), err)))?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|err| SnapshotError::Json(err.to_string()))?;
    let canonical = canonical_json_bytes(&value)?;
    let sha256 = sha256_hex(&canonical);
    let snapshot: Snapshot =
        serde_json::from_value(value).map_err(|err| SnapshotError::Json(err.to_string()))?;
    Ok(SnapshotWithHash { snapshot, sha256 })
}

pub fn canonical_json_bytes(value: &Value) -> Result<Vec<u8>, SnapshotError> {
    let mut out = String::new();
    write_canonical_json(value, &mut out)?;
    Ok(out.into_bytes())
}

fn write_canonical_json(value: &Value, out: &mut String) -> Result<(), SnapshotError> {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            let s = serde_json::to_string(value)
                .map_err(|err| SnapshotError::Canonical(err.to_string()))?;
            out.push_str(&s);
            Ok(())
        }
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_canonical_json(item, out)?;
            }
            out.push(']');
            Ok(())
        }
        Value::Object(map) => {
            out.push('{');
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            for (idx, key) in keys.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                let key_json = serde_json::to_string(key)
                    .map_err(|err| SnapshotError::Canonical(err.to_string()))?;
                out.push_str(&key_json);
                out.push(':');
                if let Some(val) = map.get(*key) {
                    write_canonical_json(val, out)?;
                }
            }
            out.push('}');
            Ok(())
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

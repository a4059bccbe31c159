use chrono::NaiveDate;
use serde_json::Value;

use kb_core::{Issue, Severity};
use kb_scan::{Depth, Document};

pub const RULE_METADATA_COMPLETENESS: &str = "metadata/completeness";
pub const RULE_SOURCE_URL: &str = "metadata/source-url";
pub const RULE_FRESHNESS: &str = "metadata/freshness";
pub const RULE_SECTION_ORDERING: &str = "structure/section-ordering";
pub const RULE_SIZE_BOUNDS: &str = "structure/size-bounds";
pub const RULE_SECTION_COMPLETENESS: &str = "structure/section-completeness";
pub const RULE_HEADING_HIERARCHY: &str = "structure/heading-hierarchy";

/// Days after which `last_validated` content needs re-validation.
pub const MAX_CONTENT_AGE_DAYS: i64 = 90;

const REQUIRED_FIELDS: &[&str] = &["sources", "last_validated", "relevance", "depth"];

/// Closed line-count interval per depth; exactly lo or hi lines is in
/// bounds.
const SIZE_BOUNDS: &[(Depth, usize, usize)] = &[
    (Depth::Overview, 5, 150),
    (Depth::Working, 10, 400),
    (Depth::Reference, 3, 150),
];

const WORKING_SECTIONS: &[&str] = &[
    "Why This Matters",
    "In Practice",
    "Key Guidance",
    "Watch Out For",
    "Go Deeper",
];

const OVERVIEW_SECTIONS: &[&str] = &["What This Covers", "How It's Organized"];

fn issue(rule_id: &str, severity: Severity, doc: &Document, message: String) -> Issue {
    Issue::new(rule_id, severity, doc.display_path.clone(), message)
}

/// Required header keys present and non-empty; `depth` one of the three
/// known values. A missing or malformed header is itself the finding.
pub fn metadata_completeness(doc: &Document) -> Vec<Issue> {
    let mut issues = Vec::new();

    if let Some(err) = doc.header_error.as_ref() {
        issues.push(issue(
            RULE_METADATA_COMPLETENESS,
            Severity::Fail,
            doc,
            format!("Malformed metadata header: {}", err),
        ));
        return issues;
    }
    let Some(header) = doc.header.as_ref() else {
        issues.push(issue(
            RULE_METADATA_COMPLETENESS,
            Severity::Fail,
            doc,
            "Missing metadata header".to_string(),
        ));
        return issues;
    };

    for field in REQUIRED_FIELDS {
        if !header.has_value(field) {
            issues.push(issue(
                RULE_METADATA_COMPLETENESS,
                Severity::Fail,
                doc,
                format!("Missing required header field: {}", field),
            ));
        }
    }

    if header.has_value("depth") {
        let invalid = match header.fields.get("depth") {
            Some(Value::String(raw)) => {
                Depth::parse(raw).is_none().then(|| raw.clone())
            }
            Some(other) => Some(other.to_string()),
            None => None,
        };
        if let Some(raw) = invalid {
            issues.push(issue(
                RULE_METADATA_COMPLETENESS,
                Severity::Fail,
                doc,
                format!(
                    "Invalid depth '{}'; must be one of [overview, reference, working]",
                    raw
                ),
            ));
        }
    }

    issues
}

/// Every `sources` entry must be an http(s) URL. Entries carrying an HTML
/// comment marker are placeholders and skipped; a leading `url:` prefix
/// from structured YAML is stripped first.
pub fn source_url_format(doc: &Document) -> Vec<Issue> {
    let Some(sources) = doc.header.as_ref().and_then(|h| h.sources()) else {
        return Vec::new();
    };

    let mut issues = Vec::new();
    for entry in sources {
        let mut url = entry.trim();
        if let Some(rest) = url.strip_prefix("url:") {
            url = rest.trim();
        }
        if url.contains("<!--") {
            continue;
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            issues.push(issue(
                RULE_SOURCE_URL,
                Severity::Fail,
                doc,
                format!("Malformed source URL: {}", url),
            ));
        }
    }
    issues
}

/// `last_validated` must parse as an ISO calendar date and be at most
/// [`MAX_CONTENT_AGE_DAYS`] old relative to the injected scan date.
pub fn freshness(doc: &Document, today: NaiveDate) -> Vec<Issue> {
    let Some(raw) = doc.header.as_ref().and_then(|h| h.last_validated()) else {
        return Vec::new();
    };

    let validated = match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            return vec![issue(
                RULE_FRESHNESS,
                Severity::Warn,
                doc,
                format!("Invalid last_validated date: {}", raw),
            )];
        }
    };

    let age = (today - validated).num_days();
    if age > MAX_CONTENT_AGE_DAYS {
        return vec![issue(
            RULE_FRESHNESS,
            Severity::Warn,
            doc,
            format!(
                "Content is {} days old (max {}); needs re-validation",
                age, MAX_CONTENT_AGE_DAYS
            ),
        )];
    }

    Vec::new()
}

/// In working-depth documents the concrete "In Practice" section must come
/// before the abstract "Key Guidance" section.
pub fn section_ordering(doc: &Document) -> Vec<Issue> {
    if doc.depth() != Some(Depth::Working) {
        return Vec::new();
    }

    let mut in_practice_idx: Option<usize> = None;
    let mut key_guidance_idx: Option<usize> = None;
    for (idx, section) in doc.sections.iter().filter(|s| s.level == 2).enumerate() {
        let title = section.title.to_lowercase();
        if in_practice_idx.is_none() && title.contains("in practice") {
            in_practice_idx = Some(idx);
        }
        if key_guidance_idx.is_none() && title.contains("key guidance") {
            key_guidance_idx = Some(idx);
        }
    }

    if let (Some(ip), Some(kg)) = (in_practice_idx, key_guidance_idx) {
        if kg < ip {
            return vec![issue(
                RULE_SECTION_ORDERING,
                Severity::Warn,
                doc,
                "'In Practice' must appear before 'Key Guidance' (concrete before abstract)"
                    .to_string(),
            )];
        }
    }

    Vec::new()
}

pub fn size_bounds(doc: &Document) -> Vec<Issue> {
    let Some(depth) = doc.depth() else {
        return Vec::new();
    };
    let Some(&(_, lo, hi)) = SIZE_BOUNDS.iter().find(|(d, _, _)| *d == depth) else {
        return Vec::new();
    };

    if doc.line_count < lo {
        vec![issue(
            RULE_SIZE_BOUNDS,
            Severity::Warn,
            doc,
            format!(
                "File has {} lines; expected at least {} for depth '{}'",
                doc.line_count,
                lo,
                depth.as_str()
            ),
        )]
    } else if doc.line_count > hi {
        vec![issue(
            RULE_SIZE_BOUNDS,
            Severity::Warn,
            doc,
            format!(
                "File has {} lines; expected at most {} for depth '{}'",
                doc.line_count,
                hi,
                depth.as_str()
            ),
        )]
    } else {
        Vec::new()
    }
}

/// Depth-expected sections must be present; reference files just need a
/// non-empty body.
pub fn section_completeness(doc: &Document) -> Vec<Issue> {
    let expected: &[&str] = match doc.depth() {
        Some(Depth::Working) => WORKING_SECTIONS,
        Some(Depth::Overview) => OVERVIEW_SECTIONS,
        Some(Depth::Reference) => {
            if doc.body.trim().is_empty() {
                return vec![issue(
                    RULE_SECTION_COMPLETENESS,
                    Severity::Warn,
                    doc,
                    "Reference file has no content after header".to_string(),
                )];
            }
            return Vec::new();
        }
        None => return Vec::new(),
    };

    let headings: Vec<String> = doc
        .sections
        .iter()
        .filter(|s| s.level == 2)
        .map(|s| s.title.to_lowercase())
        .collect();

    let mut issues = Vec::new();
    for section in expected {
        let needle = section.to_lowercase();
        if !headings.iter().any(|h| h.contains(&needle)) {
            issues.push(issue(
                RULE_SECTION_COMPLETENESS,
                Severity::Warn,
                doc,
                format!("Missing required section: {}", section),
            ));
        }
    }
    issues
}

/// Exactly one H1 and no skipped heading levels.
pub fn heading_hierarchy(doc: &Document) -> Vec<Issue> {
    let levels: Vec<u8> = doc.sections.iter().map(|s| s.level).collect();
    let mut issues = Vec::new();

    let h1_count = levels.iter().filter(|&&l| l == 1).count();
    if h1_count == 0 {
        issues.push(issue(
            RULE_HEADING_HIERARCHY,
            Severity::Warn,
            doc,
            "No H1 heading found".to_string(),
        ));
    } else if h1_count > 1 {
        issues.push(issue(
            RULE_HEADING_HIERARCHY,
            Severity::Warn,
            doc,
            format!(
                "Multiple H1 headings found ({}); expected exactly 1",
                h1_count
            ),
        ));
    }

    for pair in levels.windows(2) {
        if pair[1] > pair[0] + 1 {
            issues.push(issue(
                RULE_HEADING_HIERARCHY,
                Severity::Warn,
                doc,
                format!("Skipped heading level: H{} to H{}", pair[0], pair[1]),
            ));
        }
    }

    issues
}

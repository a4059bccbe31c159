use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::header::{extract_header, HeaderBlock};
use crate::links::{extract_links, LinkRef};

/// Declared position of a document in the progressive-disclosure scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Overview,
    Working,
    Reference,
}

impl Depth {
    pub fn parse(raw: &str) -> Option<Depth> {
        match raw {
            "overview" => Some(Depth::Overview),
            "working" => Some(Depth::Working),
            "reference" => Some(Depth::Reference),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Depth::Overview => "overview",
            Depth::Working => "working",
            Depth::Reference => "reference",
        }
    }
}

/// Parsed metadata header with typed accessors over the raw field map.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub fields: BTreeMap<String, Value>,
}

impl Header {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }

    /// The `sources` list. A scalar string is accepted as a one-element
    /// list; structured `- url: ...` entries collapse to their url string.
    /// `None` when the field is absent or null.
    pub fn sources(&self) -> Option<Vec<String>> {
        match self.fields.get("sources")? {
            Value::String(s) => Some(vec![s.clone()]),
            Value::Array(items) => Some(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        Value::Object(map) => map
                            .get("url")
                            .and_then(|v| v.as_str())
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| item.to_string()),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn last_validated(&self) -> Option<&str> {
        self.str_field("last_validated")
    }

    pub fn relevance(&self) -> Option<&str> {
        self.str_field("relevance")
    }

    pub fn depth_raw(&self) -> Option<&str> {
        self.str_field("depth")
    }

    pub fn depth(&self) -> Option<Depth> {
        self.depth_raw().and_then(Depth::parse)
    }

    /// True when the field is present with a non-empty value. Empty lists
    /// and empty strings count as missing.
    pub fn has_value(&self, key: &str) -> bool {
        match self.fields.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(_) => true,
        }
    }
}

/// One body heading: `(level, title, 1-based file line)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub level: u8,
    pub title: String,
    pub line: u32,
}

/// Characters per approximate token. An explicit heuristic, not a
/// tokenizer: counts are for trend tracking, never for billing-grade
/// accuracy.
pub const CHARS_PER_TOKEN: usize = 4;

/// One parsed document. Owned by a single scan pass and recreated fresh on
/// every run; there is no persistent identity across runs.
#[derive(Debug, Clone)]
pub struct Document {
    /// Corpus-relative path with `/` separators.
    pub rel_path: String,
    /// Path as cited in issues (root-joined).
    pub display_path: String,
    /// Top-level directory this document belongs to; `None` for root-level
    /// files such as `index.md`.
    pub area: Option<String>,
    pub file_name: String,
    pub header: Option<Header>,
    /// Set when a header block was present but not a valid mapping.
    pub header_error: Option<String>,
    /// Content after the header block.
    pub body: String,
    /// Headings outside fenced code blocks, in order.
    pub sections: Vec<Section>,
    pub links: Vec<LinkRef>,
    pub line_count: usize,
    pub byte_count: u64,
    pub approx_tokens: usize,
}

impl Document {
    pub fn depth(&self) -> Option<Depth> {
        self.header.as_ref().and_then(|h| h.depth())
    }

    pub fn is_reference_file(&self) -> bool {
        self.file_name.ends_with(".ref.md")
    }
}

pub fn parse_document(root: &Path, rel_path: &str, content: &str) -> Document {
    let (header, header_error, body_start_line) = match extract_header(content) {
        HeaderBlock::Parsed { fields, end_line } => {
            (Some(Header { fields }), None, end_line as usize)
        }
        HeaderBlock::Malformed(err) => (None, Some(err), 0),
        HeaderBlock::Missing => (None, None, 0),
    };

    let lines: Vec<&str> = content.lines().collect();
    let body = if body_start_line < lines.len() {
        lines[body_start_line..].join("\n")
    } else {
        String::new()
    };

    let area = match rel_path.split_once('/') {
        Some((first, _)) => Some(first.to_string()),
        None => None,
    };
    let file_name = rel_path
        .rsplit('/')
        .next()
        .unwrap_or(rel_path)
        .to_string();

    Document {
        rel_path: rel_path.to_string(),
        display_path: root.join(rel_path).display().to_string(),
        area,
        file_name,
        header,
        header_error,
        sections: extract_sections(&lines, body_start_line),
        links: extract_links(content),
        line_count: lines.len(),
        byte_count: content.len() as u64,
        approx_tokens: content.chars().count() / CHARS_PER_TOKEN,
        body,
    }
}

/// Collect headings from the body, ignoring anything inside ``` fences.
fn extract_sections(lines: &[&str], body_start_line: usize) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut in_fence = false;

    for (idx, line) in lines.iter().enumerate().skip(body_start_line) {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some((level, title)) = parse_heading(line) {
            sections.push(Section {
                level,
                title,
                line: (idx + 1) as u32,
            });
        }
    }

    sections
}

fn parse_heading(line: &str) -> Option<(u8, String)> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }
    let title = rest.trim();
    if title.is_empty() {
        return None;
    }
    Some((hashes as u8, title.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn doc(rel: &str, content: &str) -> Document {
        parse_document(&PathBuf::from("/kb"), rel, content)
    }

    #[test]
    fn parses_full_document() {
        let content = "---\ndepth: working\nrelevance: auction flow\nlast_validated: 2026-07-01\nsources:\n  - https://example.com/guide\n---\n# Bidding\n\n## In Practice\nDo the thing.\n\n## Key Guidance\nPrinciples here. See [setup](../infra/setup.md).\n";
        let d = doc("auctions/bidding.md", content);
        assert_eq!(d.area.as_deref(), Some("auctions"));
        assert_eq!(d.file_name, "bidding.md");
        assert_eq!(d.depth(), Some(Depth::Working));
        assert_eq!(d.header.as_ref().unwrap().sources().unwrap().len(), 1);
        assert_eq!(d.links.len(), 1);
        let titles: Vec<&str> = d.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Bidding", "In Practice", "Key Guidance"]);
    }

    #[test]
    fn root_level_file_has_no_area() {
        let d = doc("index.md", "# Index\n");
        assert_eq!(d.area, None);
    }

    #[test]
    fn headings_inside_fences_ignored() {
        let content = "# Top\n```\n# not a heading\n## also not\n```\n## Real\n";
        let d = doc("a/x.md", content);
        let titles: Vec<&str> = d.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Top", "Real"]);
    }

    #[test]
    fn section_lines_are_file_lines() {
        let content = "---\ndepth: reference\n---\n# Title\n";
        let d = doc("a/x.ref.md", content);
        assert_eq!(d.sections[0].line, 4);
        assert!(d.is_reference_file());
    }

    #[test]
    fn token_approximation_is_chars_over_four() {
        let content = "abcd".repeat(10);
        let d = doc("a/x.md", &content);
        assert_eq!(d.approx_tokens, 10);
    }

    #[test]
    fn malformed_header_is_recorded_not_fatal() {
        let d = doc("a/x.md", "---\njust a scalar\n---\nbody\n");
        assert!(d.header.is_none());
        assert!(d.header_error.is_some());
        assert_eq!(d.body, "body");
    }

    #[test]
    fn line_count_matches_splitlines_semantics() {
        let d = doc("a/x.md", "one\ntwo\nthree\n");
        assert_eq!(d.line_count, 3);
    }

    #[test]
    fn structured_source_entries_collapse_to_url() {
        let content = "---\nsources:\n  - url: https://example.com/a\n  - https://example.com/b\n---\n";
        let d = doc("a/x.md", content);
        let sources = d.header.as_ref().unwrap().sources().unwrap();
        assert_eq!(sources[0], "https://example.com/a");
        assert_eq!(sources[1], "https://example.com/b");
    }

    #[test]
    fn empty_values_count_as_missing() {
        let content = "---\nrelevance: \"\"\nsources: []\ndepth: working\n---\n";
        let d = doc("a/x.md", content);
        let h = d.header.as_ref().unwrap();
        assert!(!h.has_value("relevance"));
        assert!(!h.has_value("sources"));
        assert!(h.has_value("depth"));
        assert!(!h.has_value("last_validated"));
    }
}

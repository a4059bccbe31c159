use regex::Regex;
use std::sync::OnceLock;

/// Classification of a `[text](target)` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Relative path into the corpus; must resolve in the index.
    Internal,
    /// `http://` / `https://` URL; exempt from resolution.
    External,
    /// Pure in-document `#fragment`; exempt from resolution.
    Anchor,
    /// `mailto:` link; exempt from resolution.
    Mail,
}

/// One extracted link, positioned by 1-based line number in its source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    pub target: String,
    pub kind: LinkKind,
    pub line: u32,
}

impl LinkRef {
    /// The target with any `#fragment` stripped; what internal resolution
    /// actually checks. Empty when the link was fragment-only.
    pub fn target_path(&self) -> &str {
        match self.target.split_once('#') {
            Some((path, _)) => path,
            None => self.target.as_str(),
        }
    }
}

fn link_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\]]*)\]\(([^)]+)\)").expect("link pattern"))
}

pub fn classify_target(target: &str) -> LinkKind {
    if target.starts_with("http://") || target.starts_with("https://") {
        LinkKind::External
    } else if target.starts_with('#') {
        LinkKind::Anchor
    } else if target.starts_with("mailto:") {
        LinkKind::Mail
    } else {
        LinkKind::Internal
    }
}

/// Extract every markdown link from `content`, line by line.
pub fn extract_links(content: &str) -> Vec<LinkRef> {
    let re = link_pattern();
    let mut out = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        for caps in re.captures_iter(line) {
            let target = caps[2].trim().to_string();
            if target.is_empty() {
                continue;
            }
            let kind = classify_target(&target);
            out.push(LinkRef {
                target,
                kind,
                line: (idx + 1) as u32,
            });
        }
    }
    out
}

use regex::Regex;
use std::sync::OnceLock;

use kb_core::{Issue, Severity};
use kb_scan::{Depth, Document};

pub const RULE_READABILITY: &str = "structure/readability";

/// Flesch-Kincaid grade bounds per depth. Reference files are terse by
/// design and not scored.
const FK_GRADE_BOUNDS: &[(Depth, f64, f64)] =
    &[(Depth::Overview, 8.0, 14.0), (Depth::Working, 10.0, 16.0)];

struct Patterns {
    image: Regex,
    link: Regex,
    bold_star: Regex,
    bold_under: Regex,
    italic_star: Regex,
    italic_under: Regex,
    code: Regex,
    sentence: Regex,
    word: Regex,
    vowel_groups: Regex,
}

fn patterns() -> &'static Patterns {
    static CELL: OnceLock<Patterns> = OnceLock::new();
    CELL.get_or_init(|| Patterns {
        image: Regex::new(r"!\[[^\]]*\]\([^)]+\)").expect("image pattern"),
        link: Regex::new(r"\[([^\]]*)\]\([^)]+\)").expect("link pattern"),
        bold_star: Regex::new(r"\*\*(.+?)\*\*").expect("bold star pattern"),
        bold_under: Regex::new(r"__(.+?)__").expect("bold underscore pattern"),
        italic_star: Regex::new(r"\*(.+?)\*").expect("italic star pattern"),
        italic_under: Regex::new(r"(^|[^A-Za-z0-9_])_([^_]+)_([^A-Za-z0-9_]|$)")
            .expect("italic underscore pattern"),
        code: Regex::new(r"`([^`]+)`").expect("code pattern"),
        sentence: Regex::new(r"[.!?]+").expect("sentence pattern"),
        word: Regex::new(r"[a-zA-Z]+").expect("word pattern"),
        vowel_groups: Regex::new(r"[aeiouy]+").expect("vowel pattern"),
    })
}

/// Count syllables via the vowel-group heuristic: strip a trailing silent
/// `e`, count contiguous `[aeiouy]+` runs, minimum one per word.
fn count_syllables(word: &str) -> usize {
    let lowered = word.to_lowercase();
    let w = lowered.trim();
    if w.is_empty() {
        return 1;
    }
    let w = if w.len() > 2 && w.ends_with('e') {
        &w[..w.len() - 1]
    } else {
        w
    };
    patterns().vowel_groups.find_iter(w).count().max(1)
}

/// Remove markdown inline formatting, keeping plain text.
fn strip_markdown_formatting(text: &str) -> String {
    let p = patterns();
    let text = p.image.replace_all(text, "");
    let text = p.link.replace_all(&text, "$1");
    let text = p.bold_star.replace_all(&text, "$1");
    let text = p.bold_under.replace_all(&text, "$1");
    let text = p.italic_star.replace_all(&text, "$1");
    let text = p.italic_under.replace_all(&text, "${1}${2}${3}");
    p.code.replace_all(&text, "$1").into_owned()
}

/// Replace fenced code block content with blank lines.
fn strip_fenced_blocks(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut in_fence = false;
    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            out.push("");
        } else if in_fence {
            out.push("");
        } else {
            out.push(line);
        }
    }
    out.join("\n")
}

/// Flesch-Kincaid grade level, or `None` when there is too little text to
/// score (fewer than 3 sentences, or no words).
fn flesch_kincaid_grade(text: &str) -> Option<f64> {
    let p = patterns();
    let sentences: Vec<&str> = p
        .sentence
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if sentences.len() < 3 {
        return None;
    }

    let mut num_words = 0usize;
    let mut total_syllables = 0usize;
    for sentence in &sentences {
        for word in p.word.find_iter(sentence) {
            num_words += 1;
            total_syllables += count_syllables(word.as_str());
        }
    }
    if num_words == 0 {
        return None;
    }

    Some(
        0.39 * (num_words as f64 / sentences.len() as f64)
            + 11.8 * (total_syllables as f64 / num_words as f64)
            - 15.59,
    )
}

/// Prose grade level must sit inside the band for the document's depth.
pub fn readability(doc: &Document) -> Vec<Issue> {
    let Some(depth) = doc.depth() else {
        return Vec::new();
    };
    let Some(&(_, lo, hi)) = FK_GRADE_BOUNDS.iter().find(|(d, _, _)| *d == depth) else {
        return Vec::new();
    };

    let text = strip_markdown_formatting(&strip_fenced_blocks(&doc.body));
    let Some(grade) = flesch_kincaid_grade(&text) else {
        return Vec::new();
    };

    if grade < lo {
        vec![Issue::new(
            RULE_READABILITY,
            Severity::Warn,
            doc.display_path.clone(),
            format!(
                "Readability grade {:.1} below {} for depth '{}' (may be too simplistic)",
                grade,
                lo,
                depth.as_str()
            ),
        )]
    } else if grade > hi {
        vec![Issue::new(
            RULE_READABILITY,
            Severity::Warn,
            doc.display_path.clone(),
            format!(
                "Readability grade {:.1} above {} for depth '{}' (may be too complex)",
                grade,
                hi,
                depth.as_str()
            ),
        )]
    } else {
        Vec::new()
    }
}

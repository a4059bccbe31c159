use serde::{Deserialize, Serialize};

/// Content-violation severity. A closed two-case enum; the reducer matches
/// totally over it and anything outside this vocabulary is a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warn,
    Fail,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warn => "warn",
            Severity::Fail => "fail",
        }
    }
}

/// A single rule finding against one file (or one area directory).
///
/// Issues are produced fresh on every run and never merged across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub file: String,
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    pub fn new(
        rule_id: &str,
        severity: Severity,
        file: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Issue {
            file: file.into(),
            rule_id: rule_id.to_string(),
            severity,
            message: message.into(),
        }
    }
}

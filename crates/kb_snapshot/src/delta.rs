use serde::{Deserialize, Serialize};

use crate::Snapshot;

/// Trend classification for one metric between two snapshots.
///
/// Boundary policy (fixed, tested exactly): `improved` iff pct <= -5,
/// `stable` iff -5 < pct <= 5, `growing` iff 5 < pct < 20, `alert` iff
/// pct >= 20.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendClass {
    Improved,
    Stable,
    Growing,
    Alert,
}

impl TrendClass {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendClass::Improved => "improved",
            TrendClass::Stable => "stable",
            TrendClass::Growing => "growing",
            TrendClass::Alert => "alert",
        }
    }
}

/// Per-metric difference between the persisted baseline and the current
/// scan. Computed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub metric: String,
    pub baseline: u64,
    pub current: u64,
    /// Percent change; `None` when the baseline value was 0 (a metric that
    /// is new in this comparison, not a division by zero).
    pub pct_change: Option<f64>,
    pub trend: TrendClass,
}

pub fn classify_trend(pct: f64) -> TrendClass {
    if pct <= -5.0 {
        TrendClass::Improved
    } else if pct <= 5.0 {
        TrendClass::Stable
    } else if pct < 20.0 {
        TrendClass::Growing
    } else {
        TrendClass::Alert
    }
}

fn delta_for(metric: &str, baseline: u64, current: u64) -> Delta {
    if baseline == 0 {
        let trend = if current == 0 {
            TrendClass::Stable
        } else {
            TrendClass::Growing
        };
        return Delta {
            metric: metric.to_string(),
            baseline,
            current,
            pct_change: None,
            trend,
        };
    }

    let pct = (current as f64 - baseline as f64) / baseline as f64 * 100.0;
    Delta {
        metric: metric.to_string(),
        baseline,
        current,
        pct_change: Some(pct),
        trend: classify_trend(pct),
    }
}

/// Deltas for every tracked metric, in a fixed order.
pub fn compute_deltas(baseline: &Snapshot, current: &Snapshot) -> Vec<Delta> {
    vec![
        delta_for("total_files", baseline.total_files, current.total_files),
        delta_for("total_tokens", baseline.total_tokens, current.total_tokens),
        delta_for("total_lines", baseline.total_lines, current.total_lines),
        delta_for("total_bytes", baseline.total_bytes, current.total_bytes),
        delta_for(
            "large_files",
            baseline.large_files.len() as u64,
            current.large_files.len() as u64,
        ),
    ]
}

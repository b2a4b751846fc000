//! StatRow — one aggregated partition in a report table.

use serde::{Deserialize, Serialize};

/// Aggregated statistics for a single partition value (a participant, an
/// algorithm, an image, a question category).
///
/// Accuracy is a percentage in [0, 100] rounded to one decimal; latencies
/// are seconds rounded to two decimals, `None` when every latency in the
/// partition was null. Empty partitions are never emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    pub key: String,
    pub responses: usize,
    pub accuracy_pct: f64,
    pub mean_latency_sec: Option<f64>,
    pub median_latency_sec: Option<f64>,
    pub uncertain: Option<usize>,
}

/// Flags the best-performing partitions by accuracy.
///
/// Every row whose accuracy equals the maximum is flagged, not just the
/// first; ties produce multiple flags. Empty input yields an empty vec.
pub fn flag_max(rows: &[StatRow]) -> Vec<bool> {
    let max = rows
        .iter()
        .map(|r| r.accuracy_pct)
        .fold(f64::NEG_INFINITY, f64::max);
    rows.iter().map(|r| r.accuracy_pct == max).collect()
}

//! Grouped statistics — pure functions from record slices to stat rows.
//!
//! Every statistic is a pure function: records in, numbers out. Partitions
//! with zero rows never appear in the output — they are omitted, not
//! fabricated as 0/NaN rows.

use std::collections::HashMap;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::{ResponseRecord, StatRow};

/// Which optional statistics to compute per partition.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregationOptions<'a> {
    /// Compute mean/median latency over non-null latencies.
    pub with_latency: bool,
    /// Count answers starting with this "don't know" token.
    pub uncertain_prefix: Option<&'a str>,
    /// Report distinct participants instead of raw rows in `responses`.
    pub count_distinct_participants: bool,
}

/// Groups records by an arbitrary key and computes one StatRow per distinct
/// value. Output order is unspecified; the caller sorts for display.
pub fn aggregate_by<F>(
    records: &[ResponseRecord],
    key_fn: F,
    opts: &AggregationOptions,
) -> Vec<StatRow>
where
    F: Fn(&ResponseRecord) -> String,
{
    let mut groups: HashMap<String, Vec<&ResponseRecord>> = HashMap::new();
    for record in records {
        groups.entry(key_fn(record)).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(key, members)| stat_row(key, &members, opts))
        .collect()
}

fn stat_row(key: String, members: &[&ResponseRecord], opts: &AggregationOptions) -> StatRow {
    let responses = if opts.count_distinct_participants {
        members
            .iter()
            .map(|r| r.participant_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    } else {
        members.len()
    };

    let correct = members.iter().filter(|r| r.is_correct).count();
    let accuracy_pct = round1(correct as f64 / members.len() as f64 * 100.0);

    let (mean_latency_sec, median_latency_sec) = if opts.with_latency {
        let latencies: Vec<f64> = members.iter().filter_map(|r| r.latency_sec).collect();
        (
            mean(&latencies).map(round2),
            median(&latencies).map(round2),
        )
    } else {
        (None, None)
    };

    let uncertain = opts
        .uncertain_prefix
        .map(|prefix| members.iter().filter(|r| r.is_uncertain(prefix)).count());

    StatRow {
        key,
        responses,
        accuracy_pct,
        mean_latency_sec,
        median_latency_sec,
        uncertain,
    }
}

/// Whole-table statistics behind the metric tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub responses: usize,
    pub accuracy_pct: f64,
    pub mean_latency_sec: Option<f64>,
    pub median_latency_sec: Option<f64>,
    pub uncertain: usize,
}

/// Computes the headline tiles for a record set. `None` for an empty set —
/// the caller shows an empty state rather than zeros.
pub fn totals(records: &[ResponseRecord], uncertain_prefix: &str) -> Option<Totals> {
    if records.is_empty() {
        return None;
    }

    let correct = records.iter().filter(|r| r.is_correct).count();
    let latencies: Vec<f64> = records.iter().filter_map(|r| r.latency_sec).collect();

    Some(Totals {
        responses: records.len(),
        accuracy_pct: round1(correct as f64 / records.len() as f64 * 100.0),
        mean_latency_sec: mean(&latencies).map(round2),
        median_latency_sec: median(&latencies).map(round2),
        uncertain: records
            .iter()
            .filter(|r| r.is_uncertain(uncertain_prefix))
            .count(),
    })
}

/// Empirical quantile of non-null latencies (nearest-rank). Used to clip
/// the latency histogram at its long tail.
pub fn latency_quantile(records: &[ResponseRecord], q: f64) -> Option<f64> {
    let mut latencies: Vec<f64> = records.iter().filter_map(|r| r.latency_sec).collect();
    if latencies.is_empty() {
        return None;
    }
    latencies.sort_by(|a, b| a.total_cmp(b));
    let rank = ((q.clamp(0.0, 1.0) * latencies.len() as f64).ceil() as usize)
        .saturating_sub(1)
        .min(latencies.len() - 1);
    Some(latencies[rank])
}

// ─── numeric helpers ────────────────────────────────────────────────

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

pub fn median(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

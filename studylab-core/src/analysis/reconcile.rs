//! Cross-stage reconciliation — aligns per-stage tables into one
//! comparison, plus sample-weighted pooling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::aggregate::{aggregate_by, AggregationOptions};
use crate::domain::{ResponseRecord, Stage, StatRow};

/// One partition's accuracy in both stages, absent sides filled with 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub key: String,
    pub accuracy_stage1: f64,
    pub accuracy_stage2: f64,
}

/// Long-format projection: one row per (partition, stage), for grouped bar
/// rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageAccuracy {
    pub key: String,
    pub stage: Stage,
    pub accuracy_pct: f64,
}

/// The reconciled comparison table in both shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageComparison {
    pub wide: Vec<ComparisonRow>,
    pub long: Vec<StageAccuracy>,
}

/// Outer-joins two stat tables on partition key.
///
/// Combinations present in only one stage get 0 for the other — a neutral
/// default for comparison charts, distinct from the aggregation rule that
/// empty partitions are omitted within a single stage.
pub fn reconcile(stage1: &[StatRow], stage2: &[StatRow]) -> StageComparison {
    let mut joined: BTreeMap<String, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for row in stage1 {
        joined.entry(row.key.clone()).or_default().0 = Some(row.accuracy_pct);
    }
    for row in stage2 {
        joined.entry(row.key.clone()).or_default().1 = Some(row.accuracy_pct);
    }

    let wide: Vec<ComparisonRow> = joined
        .into_iter()
        .map(|(key, (one, two))| ComparisonRow {
            key,
            accuracy_stage1: one.unwrap_or(0.0),
            accuracy_stage2: two.unwrap_or(0.0),
        })
        .collect();

    let long = wide
        .iter()
        .flat_map(|row| {
            [
                StageAccuracy {
                    key: row.key.clone(),
                    stage: Stage::One,
                    accuracy_pct: row.accuracy_stage1,
                },
                StageAccuracy {
                    key: row.key.clone(),
                    stage: Stage::Two,
                    accuracy_pct: row.accuracy_stage2,
                },
            ]
        })
        .collect();

    StageComparison { wide, long }
}

/// Pools the underlying record sets of both stages and recomputes accuracy
/// per partition over the union.
///
/// Pooling operates on raw boolean correctness values, never on the
/// pre-aggregated percentages: correct pooling is sample-weighted, and an
/// average of averages would overweight the smaller stage.
pub fn pooled_accuracy_by<F>(
    stage1: &[ResponseRecord],
    stage2: &[ResponseRecord],
    key_fn: F,
) -> Vec<StatRow>
where
    F: Fn(&ResponseRecord) -> String,
{
    let pooled: Vec<ResponseRecord> = stage1.iter().chain(stage2).cloned().collect();
    aggregate_by(&pooled, key_fn, &AggregationOptions::default())
}

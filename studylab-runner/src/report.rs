//! Stage reports — the computed tables behind the dashboard views.
//!
//! A report is recomputed per filter selection from the current snapshot;
//! nothing here touches the source. Zero rows after filtering produces an
//! explicit empty view, never charts over fabricated zeros.

use serde::{Deserialize, Serialize};

use studylab_core::analysis::{
    aggregate_by, first_exposures, latency_quantile, pooled_accuracy_by, reconcile, totals,
    AggregationOptions, StageComparison, StimulusKey, Totals,
};
use studylab_core::domain::{FilterCriteria, ResponseRecord, Stage, StatRow};

use crate::config::StudyConfig;
use crate::refresh::StageSnapshot;

pub const QUESTION_TYPE_LETTERS: &str = "letters";
pub const QUESTION_TYPE_CORNERS: &str = "corners";

/// One stage's computed tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub totals: Totals,
    /// Rows silently excluded during ingestion (unparseable timestamps),
    /// surfaced for observability. Not part of any displayed statistic.
    pub excluded_rows: usize,
    /// Latencies in seconds, clipped at the 99th percentile, ready for
    /// histogram binning.
    pub latency_histogram: Vec<f64>,
    /// Letter questions: first-exposure accuracy per algorithm, sorted by
    /// algorithm name.
    pub letters_by_algorithm: Vec<StatRow>,
    /// Corner questions restricted to the configured algorithm allow-list,
    /// sorted by algorithm name. Empty for stages without corner questions.
    pub corners_by_algorithm: Vec<StatRow>,
}

/// A stage view is either a report or an explanatory empty state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageView {
    /// No qualifying data: nobody completed the stage, or the filters
    /// matched nothing.
    Empty { excluded_rows: usize },
    Ready(Box<StageReport>),
}

impl StageView {
    pub fn as_report(&self) -> Option<&StageReport> {
        match self {
            StageView::Ready(report) => Some(report),
            StageView::Empty { .. } => None,
        }
    }
}

/// Builds one stage's view from its snapshot and the active filters.
pub fn build_stage_view(
    snapshot: &StageSnapshot,
    criteria: &FilterCriteria,
    config: &StudyConfig,
) -> StageView {
    let excluded_rows = snapshot.report.dropped_timestamps;
    let filtered = criteria.apply(&snapshot.records);

    let Some(stage_totals) = totals(&filtered, &config.uncertain_prefix) else {
        return StageView::Empty { excluded_rows };
    };

    StageView::Ready(Box::new(StageReport {
        stage: snapshot.stage,
        totals: stage_totals,
        excluded_rows,
        latency_histogram: clipped_latencies(&filtered),
        letters_by_algorithm: letters_table(&filtered, snapshot.stage),
        corners_by_algorithm: corners_table(&filtered, snapshot.stage, config),
    }))
}

/// Latencies up to the 99th percentile. The tail above it is noise from
/// participants who walked away mid-question.
fn clipped_latencies(records: &[ResponseRecord]) -> Vec<f64> {
    let Some(q99) = latency_quantile(records, 0.99) else {
        return Vec::new();
    };
    records
        .iter()
        .filter_map(|r| r.latency_sec)
        .filter(|&sec| sec <= q99)
        .collect()
}

/// First-exposure accuracy per algorithm for letter questions.
///
/// Stage 1 reports one row per first exposure; stage 2 reports distinct
/// participants, matching the deployed dashboard's two counting modes.
fn letters_table(records: &[ResponseRecord], stage: Stage) -> Vec<StatRow> {
    let letters: Vec<ResponseRecord> = records
        .iter()
        .filter(|r| r.question_type == QUESTION_TYPE_LETTERS)
        .cloned()
        .collect();
    let firsts = first_exposures(&letters, StimulusKey::StimulusId);

    let opts = AggregationOptions {
        count_distinct_participants: stage == Stage::Two,
        ..Default::default()
    };
    let mut rows = aggregate_by(&firsts, |r| r.algorithm.clone(), &opts);
    rows.sort_by(|a, b| a.key.cmp(&b.key));
    rows
}

/// Corner-question accuracy for the allow-listed algorithms. Only stage 2
/// asks corner questions.
fn corners_table(records: &[ResponseRecord], stage: Stage, config: &StudyConfig) -> Vec<StatRow> {
    if stage != Stage::Two {
        return Vec::new();
    }
    let corners: Vec<ResponseRecord> = records
        .iter()
        .filter(|r| r.question_type == QUESTION_TYPE_CORNERS)
        .filter(|r| config.corner_algorithms.iter().any(|a| *a == r.algorithm))
        .cloned()
        .collect();

    let mut rows = aggregate_by(&corners, |r| r.algorithm.clone(), &AggregationOptions::default());
    rows.sort_by(|a, b| a.key.cmp(&b.key));
    rows
}

/// The stage-1 versus stage-2 letters comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossStageReport {
    pub comparison: StageComparison,
    /// Accuracy per algorithm over the union of both stages' first-exposure
    /// samples.
    pub pooled: Vec<StatRow>,
}

/// Reconciles the two stages' letter tables and pools their samples.
pub fn build_cross_stage(stage1: &StageSnapshot, stage2: &StageSnapshot) -> CrossStageReport {
    let firsts_of = |snapshot: &StageSnapshot| {
        let letters: Vec<ResponseRecord> = snapshot
            .records
            .iter()
            .filter(|r| r.question_type == QUESTION_TYPE_LETTERS)
            .cloned()
            .collect();
        first_exposures(&letters, StimulusKey::StimulusId)
    };

    let firsts1 = firsts_of(stage1);
    let firsts2 = firsts_of(stage2);

    let table = |records: &[ResponseRecord]| {
        aggregate_by(records, |r| r.algorithm.clone(), &AggregationOptions::default())
    };

    let mut pooled = pooled_accuracy_by(&firsts1, &firsts2, |r| r.algorithm.clone());
    pooled.sort_by(|a, b| a.key.cmp(&b.key));

    CrossStageReport {
        comparison: reconcile(&table(&firsts1), &table(&firsts2)),
        pooled,
    }
}

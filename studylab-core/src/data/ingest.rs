//! Row ingestion — raw cell grids in, typed response records out.
//!
//! Ingestion is maximally permissive: no input is rejected outright. Ragged
//! rows are padded, missing columns are synthesized as null, overflow cells
//! keep generic names, and malformed cells degrade to null fields or drop
//! the single row. Anomalies are counted in the report but never change the
//! record set's statistics.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::provider::LabeledRow;
use super::schema::{ColumnReport, SheetSchema};
use crate::domain::{parse_correct, ResponseRecord, Stage};

/// Accepted timestamp shapes, tried in order. Date-only cells fall back to
/// midnight.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%d.%m.%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Lenient timestamp parsing. `None` means the row carrying the cell is
/// dropped from the record set.
pub fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    let s = cell.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Lenient numeric coercion of a millisecond cell into seconds.
pub fn parse_latency_sec(cell: &str) -> Option<f64> {
    let ms: f64 = cell.trim().parse().ok()?;
    if ms < 0.0 {
        return None;
    }
    Some(ms / 1000.0)
}

/// Counters for rows and cells that failed coercion.
///
/// The source dashboard dropped these silently; the counters exist for
/// observability and do not feed any displayed statistic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Data rows seen after optional header removal.
    pub total_rows: usize,
    /// Whether the first row matched the canonical header prefix.
    pub header_stripped: bool,
    /// Rows excluded entirely because the timestamp cell did not parse.
    pub dropped_timestamps: usize,
    /// Rows kept with a null latency because the cell was not numeric.
    pub null_latencies: usize,
    pub columns: ColumnReport,
}

/// A typed table plus its ingestion report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResult {
    pub records: Vec<ResponseRecord>,
    pub report: IngestReport,
}

/// Converts one stage's raw rows into validated records.
#[derive(Debug, Clone, Copy)]
pub struct RowIngestor {
    schema: SheetSchema,
}

impl RowIngestor {
    pub fn new(stage: Stage) -> Self {
        Self {
            schema: SheetSchema::for_stage(stage),
        }
    }

    pub fn stage(&self) -> Stage {
        self.schema.stage
    }

    /// Ingest a positional cell grid.
    ///
    /// Empty input returns an empty table with the full canonical column
    /// set in the report — never an error.
    pub fn ingest_grid(&self, grid: &[Vec<String>]) -> IngestResult {
        if grid.is_empty() {
            return IngestResult {
                records: Vec::new(),
                report: IngestReport {
                    columns: self.schema.column_report(self.schema.columns().len()),
                    ..IngestReport::default()
                },
            };
        }

        let header_stripped = self.schema.is_header_row(&grid[0]);
        let rows = if header_stripped { &grid[1..] } else { grid };

        // The longest observed row decides how many canonical columns apply.
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);

        let mut report = IngestReport {
            total_rows: rows.len(),
            header_stripped,
            columns: self.schema.column_report(width),
            ..IngestReport::default()
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");
            if let Some(record) = self.build_record(&cell, &mut report) {
                records.push(record);
            }
        }

        IngestResult { records, report }
    }

    /// Ingest labeled rows (the record-oriented endpoint).
    ///
    /// Cells are looked up by the stage's canonical column names; keys the
    /// schema does not know are reported as extra columns.
    pub fn ingest_records(&self, rows: &[LabeledRow]) -> IngestResult {
        let columns = self.schema.columns();

        let mut present = vec![false; columns.len()];
        let mut extra: Vec<String> = Vec::new();
        for row in rows {
            for key in row.keys() {
                match columns.iter().position(|c| c.eq_ignore_ascii_case(key)) {
                    Some(i) => present[i] = true,
                    None if !extra.contains(key) => extra.push(key.clone()),
                    None => {}
                }
            }
        }
        let column_report = if rows.is_empty() {
            self.schema.column_report(columns.len())
        } else {
            ColumnReport {
                named: columns
                    .iter()
                    .zip(&present)
                    .filter(|(_, p)| **p)
                    .map(|(c, _)| c.to_string())
                    .collect(),
                synthesized: columns
                    .iter()
                    .zip(&present)
                    .filter(|(_, p)| !**p)
                    .map(|(c, _)| c.to_string())
                    .collect(),
                extra,
            }
        };

        let mut report = IngestReport {
            total_rows: rows.len(),
            header_stripped: false,
            columns: column_report,
            ..IngestReport::default()
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let cell = |idx: usize| {
                columns
                    .get(idx)
                    .and_then(|name| {
                        row.iter()
                            .find(|(k, _)| k.eq_ignore_ascii_case(name))
                            .map(|(_, v)| v.as_str())
                    })
                    .unwrap_or("")
            };
            if let Some(record) = self.build_record(&cell, &mut report) {
                records.push(record);
            }
        }

        IngestResult { records, report }
    }

    /// Coerce one row's cells into a record, or drop it on a bad timestamp.
    fn build_record<'a>(
        &self,
        cell: &impl Fn(usize) -> &'a str,
        report: &mut IngestReport,
    ) -> Option<ResponseRecord> {
        let m = &self.schema.mapping;

        let timestamp = match parse_timestamp(cell(m.timestamp)) {
            Some(ts) => ts,
            None => {
                report.dropped_timestamps += 1;
                return None;
            }
        };

        let latency_sec = parse_latency_sec(cell(m.latency_ms));
        if latency_sec.is_none() {
            report.null_latencies += 1;
        }

        let optional = |idx: Option<usize>| idx.map(cell).unwrap_or("").to_string();

        Some(ResponseRecord {
            timestamp,
            participant_id: cell(m.participant_id).to_string(),
            question_index: cell(m.question_index).trim().parse().ok(),
            stimulus_id: cell(m.stimulus_id).to_string(),
            algorithm: cell(m.algorithm).to_string(),
            question_type: cell(m.question_type).to_string(),
            question_text: optional(m.question_text),
            answer_text: cell(m.answer_text).to_string(),
            expected_answer_text: optional(m.expected_answer_text),
            latency_sec,
            is_correct: parse_correct(cell(m.is_correct)),
            session_id: m.session_id.and_then(|idx| {
                let v = cell(idx);
                (!v.is_empty()).then(|| v.to_string())
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage1_row(timestamp: &str, participant: &str, latency_ms: &str) -> Vec<String> {
        vec![
            timestamp.into(),
            participant.into(),
            "1".into(),
            "img_1".into(),
            "alg_a".into(),
            "letters".into(),
            "Which letter?".into(),
            "K".into(),
            "K".into(),
            latency_ms.into(),
            "TRUE".into(),
            "sess_1".into(),
        ]
    }

    #[test]
    fn empty_grid_yields_empty_table_with_full_columns() {
        let result = RowIngestor::new(Stage::One).ingest_grid(&[]);
        assert!(result.records.is_empty());
        assert_eq!(result.report.columns.named.len(), 12);
        assert!(result.report.columns.synthesized.is_empty());
    }

    #[test]
    fn header_row_is_stripped() {
        let header: Vec<String> = super::super::schema::STAGE1_COLUMNS
            .iter()
            .map(|c| c.to_uppercase())
            .collect();
        let grid = vec![header, stage1_row("2024-05-10 12:00:00", "P1", "1500")];
        let result = RowIngestor::new(Stage::One).ingest_grid(&grid);
        assert!(result.report.header_stripped);
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn grid_without_header_keeps_all_rows() {
        let grid = vec![
            stage1_row("2024-05-10 12:00:00", "P1", "1500"),
            stage1_row("2024-05-10 12:01:00", "P1", "900"),
        ];
        let result = RowIngestor::new(Stage::One).ingest_grid(&grid);
        assert!(!result.report.header_stripped);
        assert_eq!(result.records.len(), 2);
    }

    #[test]
    fn bad_timestamp_drops_row_and_is_counted() {
        let grid = vec![
            stage1_row("not a date", "P1", "1500"),
            stage1_row("2024-05-10 12:00:00", "P2", "1500"),
        ];
        let result = RowIngestor::new(Stage::One).ingest_grid(&grid);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].participant_id, "P2");
        assert_eq!(result.report.dropped_timestamps, 1);
    }

    #[test]
    fn latency_derivation_and_null_policy() {
        let grid = vec![
            stage1_row("2024-05-10 12:00:00", "P1", "1500"),
            stage1_row("2024-05-10 12:01:00", "P1", "abc"),
        ];
        let result = RowIngestor::new(Stage::One).ingest_grid(&grid);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].latency_sec, Some(1.5));
        assert_eq!(result.records[1].latency_sec, None);
        assert_eq!(result.report.null_latencies, 1);
    }

    #[test]
    fn ragged_rows_are_padded_with_nulls() {
        let mut short = stage1_row("2024-05-10 12:00:00", "P1", "1500");
        short.truncate(8); // cuts expected answer, latency, correctness, session
        let result = RowIngestor::new(Stage::One).ingest_grid(&[short]);
        let record = &result.records[0];
        assert_eq!(record.expected_answer_text, "");
        assert_eq!(record.latency_sec, None);
        assert!(!record.is_correct);
        assert!(record.session_id.is_none());
    }

    #[test]
    fn overflow_cells_get_generic_column_names() {
        let mut wide = stage1_row("2024-05-10 12:00:00", "P1", "1500");
        wide.push("overflow".into());
        let result = RowIngestor::new(Stage::One).ingest_grid(&[wide]);
        assert_eq!(result.report.columns.extra, vec!["col_12"]);
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn ingestion_is_idempotent() {
        let grid = vec![
            stage1_row("2024-05-10 12:00:00", "P1", "1500"),
            stage1_row("bad", "P2", "x"),
        ];
        let ingestor = RowIngestor::new(Stage::One);
        assert_eq!(ingestor.ingest_grid(&grid), ingestor.ingest_grid(&grid));
    }

    #[test]
    fn labeled_rows_map_stage2_fields() {
        let row: LabeledRow = [
            ("timestamp", "2024-06-01 10:00:00"),
            ("user", "P9"),
            ("qnum", "3"),
            ("group", "g1"),
            ("alg", "alg_b"),
            ("qtype", "letters"),
            ("answer", "M"),
            ("is_correct", "yes"),
            ("time_ms", "2000"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let result = RowIngestor::new(Stage::Two).ingest_records(&[row]);
        assert_eq!(result.records.len(), 1);
        let record = &result.records[0];
        assert_eq!(record.participant_id, "P9");
        assert_eq!(record.stimulus_id, "g1");
        assert_eq!(record.algorithm, "alg_b");
        assert_eq!(record.latency_sec, Some(2.0));
        assert!(record.is_correct);
        assert!(record.session_id.is_none());
        assert_eq!(result.report.columns.synthesized, Vec::<String>::new());
    }

    #[test]
    fn unknown_labeled_keys_are_reported_extra() {
        let row: LabeledRow = [
            ("timestamp", "2024-06-01 10:00:00"),
            ("user", "P9"),
            ("mystery", "?"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let result = RowIngestor::new(Stage::Two).ingest_records(&[row]);
        assert_eq!(result.report.columns.extra, vec!["mystery"]);
        assert!(result
            .report
            .columns
            .synthesized
            .contains(&"alg".to_string()));
    }
}

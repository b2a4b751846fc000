//! Per-stage sheet schemas and the canonical field mapping.
//!
//! Both stages feed the same `ResponseRecord`; the schema differences
//! (column names, optional trailing session column, stage 2's shorter row)
//! live here as an explicit mapping table instead of duplicated pipelines.

use serde::{Deserialize, Serialize};

use crate::domain::Stage;

/// Canonical stage-1 column order. The trailing session column is optional.
pub const STAGE1_COLUMNS: &[&str] = &[
    "timestamp",
    "participant_id",
    "question_index",
    "stimulus_id",
    "algorithm",
    "question_type",
    "question_text",
    "answer_text",
    "expected_answer_text",
    "latency_ms",
    "is_correct",
    "session_id",
];

/// Canonical stage-2 column order. Field names differ from stage 1 but map
/// 1:1 onto the same record semantics.
pub const STAGE2_COLUMNS: &[&str] = &[
    "timestamp",
    "user",
    "qnum",
    "group",
    "alg",
    "qtype",
    "answer",
    "is_correct",
    "time_ms",
];

/// Cell indices of each record field within a stage's canonical row.
///
/// `None` means the stage's schema has no such column; the record field is
/// synthesized as empty/None.
#[derive(Debug, Clone, Copy)]
pub struct SchemaMapping {
    pub timestamp: usize,
    pub participant_id: usize,
    pub question_index: usize,
    pub stimulus_id: usize,
    pub algorithm: usize,
    pub question_type: usize,
    pub question_text: Option<usize>,
    pub answer_text: usize,
    pub expected_answer_text: Option<usize>,
    pub latency_ms: usize,
    pub is_correct: usize,
    pub session_id: Option<usize>,
}

/// The schema of one stage's worksheet.
#[derive(Debug, Clone, Copy)]
pub struct SheetSchema {
    pub stage: Stage,
    columns: &'static [&'static str],
    pub mapping: SchemaMapping,
}

impl SheetSchema {
    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::One => Self {
                stage,
                columns: STAGE1_COLUMNS,
                mapping: SchemaMapping {
                    timestamp: 0,
                    participant_id: 1,
                    question_index: 2,
                    stimulus_id: 3,
                    algorithm: 4,
                    question_type: 5,
                    question_text: Some(6),
                    answer_text: 7,
                    expected_answer_text: Some(8),
                    latency_ms: 9,
                    is_correct: 10,
                    session_id: Some(11),
                },
            },
            Stage::Two => Self {
                stage,
                columns: STAGE2_COLUMNS,
                mapping: SchemaMapping {
                    timestamp: 0,
                    participant_id: 1,
                    question_index: 2,
                    stimulus_id: 3,
                    algorithm: 4,
                    question_type: 5,
                    question_text: None,
                    answer_text: 6,
                    expected_answer_text: None,
                    latency_ms: 8,
                    is_correct: 7,
                    session_id: None,
                },
            },
        }
    }

    /// Canonical column names in worksheet order.
    pub fn columns(&self) -> &'static [&'static str] {
        self.columns
    }

    /// Header detection: the first row is a header when its first three
    /// cells case-insensitively equal the canonical prefix.
    pub fn is_header_row(&self, row: &[String]) -> bool {
        if row.len() < 3 {
            return false;
        }
        row.iter()
            .take(3)
            .zip(self.columns.iter())
            .all(|(cell, name)| cell.trim().eq_ignore_ascii_case(name))
    }

    /// Describes which canonical columns a grid of the given width supplies,
    /// which must be synthesized as null, and which overflow cells get
    /// generic names.
    pub fn column_report(&self, width: usize) -> ColumnReport {
        let named: Vec<String> = self
            .columns
            .iter()
            .take(width)
            .map(|c| c.to_string())
            .collect();
        let synthesized: Vec<String> = self
            .columns
            .iter()
            .skip(width)
            .map(|c| c.to_string())
            .collect();
        let extra: Vec<String> = (self.columns.len()..width)
            .map(|i| format!("col_{i}"))
            .collect();
        ColumnReport {
            named,
            synthesized,
            extra,
        }
    }
}

/// Which columns the source actually supplied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnReport {
    /// Canonical columns present in the grid.
    pub named: Vec<String>,
    /// Canonical columns absent from the grid, filled as null.
    pub synthesized: Vec<String>,
    /// Overflow cells beyond the canonical set, kept under generic names.
    pub extra: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_schemas_map_shared_fields() {
        let s1 = SheetSchema::for_stage(Stage::One);
        let s2 = SheetSchema::for_stage(Stage::Two);
        assert_eq!(s1.columns()[s1.mapping.participant_id], "participant_id");
        assert_eq!(s2.columns()[s2.mapping.participant_id], "user");
        assert_eq!(s1.columns()[s1.mapping.latency_ms], "latency_ms");
        assert_eq!(s2.columns()[s2.mapping.latency_ms], "time_ms");
        assert!(s2.mapping.session_id.is_none());
    }

    #[test]
    fn header_detection_is_case_insensitive() {
        let schema = SheetSchema::for_stage(Stage::One);
        let header = vec![
            "TIMESTAMP".to_string(),
            "Participant_Id".to_string(),
            "question_index".to_string(),
        ];
        assert!(schema.is_header_row(&header));

        let data = vec![
            "2024-05-10 12:00:00".to_string(),
            "P1".to_string(),
            "1".to_string(),
        ];
        assert!(!schema.is_header_row(&data));
    }

    #[test]
    fn column_report_splits_named_synthesized_extra() {
        let schema = SheetSchema::for_stage(Stage::One);

        let narrow = schema.column_report(10);
        assert_eq!(narrow.named.len(), 10);
        assert_eq!(narrow.synthesized, vec!["is_correct", "session_id"]);
        assert!(narrow.extra.is_empty());

        let wide = schema.column_report(14);
        assert_eq!(wide.named.len(), 12);
        assert!(wide.synthesized.is_empty());
        assert_eq!(wide.extra, vec!["col_12", "col_13"]);
    }
}

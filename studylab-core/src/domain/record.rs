//! ResponseRecord — one answered question from the study log.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One of the two independent question sets presented to participants.
///
/// Stage one is the 40-question set on the default worksheet; stage two is
/// the 15-question set on a named worksheet with a shorter schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    One,
    Two,
}

impl Stage {
    /// Number of answers a participant must have submitted for the stage to
    /// count as complete. Overridable through configuration.
    pub fn default_required_answers(self) -> usize {
        match self {
            Stage::One => 40,
            Stage::Two => 15,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::One => "stage1",
            Stage::Two => "stage2",
        }
    }
}

/// One cleaned spreadsheet row: a participant answering one question.
///
/// Records are rebuilt from the raw grid on every ingestion cycle; there is
/// no persistent identity across refreshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// When the answer was submitted. Rows whose timestamp cell does not
    /// parse never become records.
    pub timestamp: NaiveDateTime,
    pub participant_id: String,
    /// Question ordinal within the stage. Used only to count responses per
    /// participant, never for ordering.
    pub question_index: Option<i64>,
    /// Identifier of the image/group shown.
    pub stimulus_id: String,
    /// Which processing variant produced the stimulus.
    pub algorithm: String,
    /// Question category, e.g. "letters" or "corners".
    pub question_type: String,
    pub question_text: String,
    pub answer_text: String,
    pub expected_answer_text: String,
    /// Response latency in seconds; `None` when the source cell failed
    /// numeric coercion. Such records still count toward response totals but
    /// are excluded from latency aggregates.
    pub latency_sec: Option<f64>,
    pub is_correct: bool,
    /// Present only in some stage-1 schema variants.
    pub session_id: Option<String>,
}

impl ResponseRecord {
    /// True if the answer text starts with the configured "don't know"
    /// token, compared on trimmed, lowercased text.
    pub fn is_uncertain(&self, prefix: &str) -> bool {
        self.answer_text
            .trim()
            .to_lowercase()
            .starts_with(&prefix.to_lowercase())
    }
}

/// Truthy-token correctness parsing.
///
/// "TRUE", "1" and "YES" (any case, surrounding whitespace ignored) mean
/// correct; everything else — including the literal "false" and empty cells
/// — means incorrect. There is no separate malformed state.
pub fn parse_correct(cell: &str) -> bool {
    matches!(cell.trim().to_uppercase().as_str(), "TRUE" | "1" | "YES")
}

//! FilterCriteria — explicit, immutable filter selections.
//!
//! The interactive dashboard kept filter state in ambient widget state; here
//! it is a value object passed into pure query functions. Empty criteria
//! retain everything.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::ResponseRecord;

/// User-chosen filters over a record set.
///
/// Each list is a whitelist; an empty list means "no restriction on this
/// dimension". The date range is inclusive on both ends and compares the
/// record's calendar date, not the full timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub participants: Vec<String>,
    pub algorithms: Vec<String>,
    pub questions: Vec<String>,
    pub stimuli: Vec<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
            && self.algorithms.is_empty()
            && self.questions.is_empty()
            && self.stimuli.is_empty()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    /// True if the record passes every active filter dimension.
    pub fn matches(&self, record: &ResponseRecord) -> bool {
        let in_list = |list: &[String], value: &str| {
            list.is_empty() || list.iter().any(|v| v == value)
        };

        if !in_list(&self.participants, &record.participant_id) {
            return false;
        }
        if !in_list(&self.algorithms, &record.algorithm) {
            return false;
        }
        if !in_list(&self.questions, &record.question_text) {
            return false;
        }
        if !in_list(&self.stimuli, &record.stimulus_id) {
            return false;
        }

        let date = record.timestamp.date();
        if self.date_from.is_some_and(|from| date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| date > to) {
            return false;
        }
        true
    }

    /// Applies the criteria to a record slice, returning the matching subset.
    ///
    /// A result of zero rows is a normal outcome the caller turns into an
    /// explanatory empty state, not an error.
    pub fn apply(&self, records: &[ResponseRecord]) -> Vec<ResponseRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

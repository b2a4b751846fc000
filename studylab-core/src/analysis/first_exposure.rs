//! First-exposure selection — the earliest response per participant and
//! stimulus group.
//!
//! For repeated stimuli, later responses are contaminated by learning and
//! memory effects; only a participant's first exposure per stimulus is an
//! unbiased accuracy sample for comparing algorithms.

use std::collections::HashSet;

use crate::domain::ResponseRecord;

/// How responses are grouped into repeated-stimulus families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StimulusKey {
    /// Group by the image/group identifier.
    StimulusId,
    /// Group by the normalized expected answer (trimmed, lowercased), for
    /// question categories keyed by content rather than image.
    ExpectedAnswer,
}

impl StimulusKey {
    fn of(self, record: &ResponseRecord) -> String {
        match self {
            StimulusKey::StimulusId => record.stimulus_id.clone(),
            StimulusKey::ExpectedAnswer => record.expected_answer_text.trim().to_lowercase(),
        }
    }
}

/// Selects each participant's chronologically earliest response per
/// stimulus group.
///
/// The sort by timestamp is stable, so rows with identical timestamps keep
/// their input order and the first one in the input wins. That tie-break is
/// deterministic across runs.
pub fn first_exposures(records: &[ResponseRecord], key: StimulusKey) -> Vec<ResponseRecord> {
    let mut ordered: Vec<&ResponseRecord> = records.iter().collect();
    ordered.sort_by_key(|r| r.timestamp);

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut firsts = Vec::new();
    for record in ordered {
        let group = (record.participant_id.clone(), key.of(record));
        if seen.insert(group) {
            firsts.push(record.clone());
        }
    }
    firsts
}

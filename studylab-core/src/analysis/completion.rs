//! Completion filter — keep only participants who finished the whole stage.

use std::collections::HashMap;

use crate::domain::ResponseRecord;

/// Retains records belonging to participants whose response count equals
/// `required` exactly.
///
/// Partial sessions are not randomly distributed across algorithms — a
/// participant who quits partway has seen only some of them — so they are
/// excluded wholesale rather than truncated. Strict equality (not "at
/// least") also drops duplicate-submission cases.
pub fn retain_complete(records: &[ResponseRecord], required: usize) -> Vec<ResponseRecord> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.participant_id.as_str()).or_default() += 1;
    }

    records
        .iter()
        .filter(|r| counts[r.participant_id.as_str()] == required)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn records_for(participant: &str, n: usize) -> Vec<ResponseRecord> {
        (0..n)
            .map(|i| ResponseRecord {
                timestamp: NaiveDate::from_ymd_opt(2024, 5, 10)
                    .unwrap()
                    .and_hms_opt(9, 0, i as u32)
                    .unwrap(),
                participant_id: participant.into(),
                question_index: Some(i as i64),
                stimulus_id: format!("img_{i}"),
                algorithm: "alg_a".into(),
                question_type: "letters".into(),
                question_text: "q".into(),
                answer_text: "a".into(),
                expected_answer_text: "a".into(),
                latency_sec: Some(1.0),
                is_correct: true,
                session_id: None,
            })
            .collect()
    }

    #[test]
    fn exact_count_is_retained() {
        let records = records_for("P1", 15);
        assert_eq!(retain_complete(&records, 15).len(), 15);
    }

    #[test]
    fn under_and_over_count_are_excluded_entirely() {
        let mut records = records_for("P1", 14);
        records.extend(records_for("P2", 16));
        records.extend(records_for("P3", 15));

        let kept = retain_complete(&records, 15);
        assert_eq!(kept.len(), 15);
        assert!(kept.iter().all(|r| r.participant_id == "P3"));
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(retain_complete(&[], 40).is_empty());
    }
}

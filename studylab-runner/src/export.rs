//! CSV export of filtered record sets.
//!
//! Output is UTF-8 with a byte-order marker so spreadsheet consumers keep
//! non-Latin answer text intact.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use studylab_core::domain::ResponseRecord;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const EXPORT_COLUMNS: [&str; 12] = [
    "timestamp",
    "participant_id",
    "question_index",
    "stimulus_id",
    "algorithm",
    "question_type",
    "question_text",
    "answer_text",
    "expected_answer_text",
    "latency_sec",
    "is_correct",
    "session_id",
];

/// Writes records in canonical column order. Null latencies and absent
/// session ids export as empty cells.
pub fn write_records_csv(path: &Path, records: &[ResponseRecord]) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("create export file {}", path.display()))?;
    file.write_all(UTF8_BOM).context("write UTF-8 BOM")?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(EXPORT_COLUMNS).context("write header")?;

    for record in records {
        writer
            .write_record([
                record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                record.participant_id.clone(),
                record
                    .question_index
                    .map(|i| i.to_string())
                    .unwrap_or_default(),
                record.stimulus_id.clone(),
                record.algorithm.clone(),
                record.question_type.clone(),
                record.question_text.clone(),
                record.answer_text.clone(),
                record.expected_answer_text.clone(),
                record
                    .latency_sec
                    .map(|sec| format!("{sec:.3}"))
                    .unwrap_or_default(),
                record.is_correct.to_string(),
                record.session_id.clone().unwrap_or_default(),
            ])
            .context("write record row")?;
    }

    writer.flush().context("flush export")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_record() -> ResponseRecord {
        ResponseRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 5, 10)
                .unwrap()
                .and_hms_opt(12, 30, 0)
                .unwrap(),
            participant_id: "P1".into(),
            question_index: Some(3),
            stimulus_id: "img_7".into(),
            algorithm: "alg_a".into(),
            question_type: "letters".into(),
            question_text: "Какая буква?".into(),
            answer_text: "Затрудняюсь ответить".into(),
            expected_answer_text: "К".into(),
            latency_sec: Some(2.5),
            is_correct: false,
            session_id: None,
        }
    }

    #[test]
    fn export_starts_with_bom_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");

        write_records_csv(&path, &[sample_record()]).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], UTF8_BOM);

        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("timestamp,participant_id"));
        let row = lines.next().unwrap();
        assert!(row.contains("Затрудняюсь ответить"));
        assert!(row.contains("2.500"));
    }

    #[test]
    fn null_fields_export_as_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");

        let mut record = sample_record();
        record.latency_sec = None;
        record.question_index = None;
        write_records_csv(&path, &[record]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert!(row.ends_with(",false,"));
    }
}

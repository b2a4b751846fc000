//! End-to-end pipeline test over the core: raw grid → ingest → completion
//! filter → aggregation → cross-stage reconciliation.

use studylab_core::analysis::{
    aggregate_by, first_exposures, pooled_accuracy_by, retain_complete, AggregationOptions,
    StimulusKey,
};
use studylab_core::data::RowIngestor;
use studylab_core::domain::Stage;

/// One stage-1 row as raw cells.
fn raw_row(
    minute: u32,
    participant: &str,
    index: usize,
    stimulus: &str,
    algorithm: &str,
    correct: bool,
) -> Vec<String> {
    vec![
        format!("2024-05-10 12:{:02}:{:02}", minute / 60, minute % 60),
        participant.to_string(),
        index.to_string(),
        stimulus.to_string(),
        algorithm.to_string(),
        "letters".to_string(),
        "Which letter?".to_string(),
        "K".to_string(),
        "K".to_string(),
        "1500".to_string(),
        if correct { "TRUE" } else { "FALSE" }.to_string(),
        "sess_1".to_string(),
    ]
}

/// Spec scenario: participant P1 answers all 40 questions, 20 per
/// algorithm, with 18/20 and 15/20 correct. Participant P2 abandons at 39
/// answers and must vanish from every table.
fn scenario_grid() -> Vec<Vec<String>> {
    let mut grid = Vec::new();
    for i in 0..20 {
        grid.push(raw_row(i as u32, "P1", i, &format!("img_{i}"), "alg_a", i < 18));
    }
    for i in 0..20 {
        grid.push(raw_row(
            20 + i as u32,
            "P1",
            20 + i,
            &format!("img_{}", 20 + i),
            "alg_b",
            i < 15,
        ));
    }
    for i in 0..39 {
        grid.push(raw_row(40 + i as u32, "P2", i, &format!("img_{i}"), "alg_a", true));
    }
    grid
}

#[test]
fn end_to_end_accuracy_by_algorithm() {
    let ingested = RowIngestor::new(Stage::One).ingest_grid(&scenario_grid());
    assert_eq!(ingested.records.len(), 79);
    assert_eq!(ingested.report.dropped_timestamps, 0);

    let complete = retain_complete(&ingested.records, 40);
    assert_eq!(complete.len(), 40);
    assert!(complete.iter().all(|r| r.participant_id == "P1"));

    let mut rows = aggregate_by(
        &complete,
        |r| r.algorithm.clone(),
        &AggregationOptions::default(),
    );
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].key, "alg_a");
    assert_eq!(rows[0].accuracy_pct, 90.0);
    assert_eq!(rows[1].key, "alg_b");
    assert_eq!(rows[1].accuracy_pct, 75.0);
}

#[test]
fn incomplete_participant_appears_in_no_output_table() {
    let ingested = RowIngestor::new(Stage::One).ingest_grid(&scenario_grid());
    let complete = retain_complete(&ingested.records, 40);

    let by_participant = aggregate_by(
        &complete,
        |r| r.participant_id.clone(),
        &AggregationOptions::default(),
    );
    assert!(by_participant.iter().all(|r| r.key != "P2"));

    let firsts = first_exposures(&complete, StimulusKey::StimulusId);
    assert!(firsts.iter().all(|r| r.participant_id == "P1"));
}

#[test]
fn header_grid_and_headerless_grid_agree() {
    let headerless = scenario_grid();
    let mut with_header = headerless.clone();
    with_header.insert(
        0,
        studylab_core::data::schema::STAGE1_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .collect(),
    );

    let ingestor = RowIngestor::new(Stage::One);
    let a = ingestor.ingest_grid(&headerless);
    let b = ingestor.ingest_grid(&with_header);

    assert!(!a.report.header_stripped);
    assert!(b.report.header_stripped);
    assert_eq!(a.records, b.records);
}

#[test]
fn pooled_accuracy_across_stages_uses_samples() {
    let ingested = RowIngestor::new(Stage::One).ingest_grid(&scenario_grid());
    let complete = retain_complete(&ingested.records, 40);
    let stage1_firsts = first_exposures(&complete, StimulusKey::StimulusId);

    // A tiny stage 2 set for alg_a: 0/2 correct. Stage 1 alg_a firsts are
    // 18/20, so pooled must be 18/22 = 81.8%.
    let mut stage2 = Vec::new();
    for i in 0..2 {
        let mut r = stage1_firsts[0].clone();
        r.stimulus_id = format!("g{i}");
        r.algorithm = "alg_a".into();
        r.is_correct = false;
        stage2.push(r);
    }

    let stage1_alg_a: Vec<_> = stage1_firsts
        .iter()
        .filter(|r| r.algorithm == "alg_a")
        .cloned()
        .collect();

    let pooled = pooled_accuracy_by(&stage1_alg_a, &stage2, |r| r.algorithm.clone());
    assert_eq!(pooled.len(), 1);
    assert_eq!(pooled[0].responses, 22);
    assert_eq!(pooled[0].accuracy_pct, 81.8);
}

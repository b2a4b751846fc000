//! Refresh orchestration — one fetch-and-recompute pass per interval.
//!
//! Each cycle fetches a stage's rows wholesale, runs them through ingestion
//! and the completion filter, and publishes a `StageSnapshot`. Within one
//! refresh interval repeated requests reuse the cached ingested table; the
//! source is hit at most once per (provider, stage, interval). Execution is
//! single-threaded and synchronous — there is no concurrent writer.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

use studylab_core::analysis::retain_complete;
use studylab_core::data::{IngestReport, RowIngestor, SheetProvider, SnapshotCache};
use studylab_core::domain::{ResponseRecord, Stage};

use crate::config::StudyConfig;

/// The latest computed state for one stage.
#[derive(Debug, Clone)]
pub struct StageSnapshot {
    pub stage: Stage,
    /// Unix seconds at which the underlying fetch happened (bucket start
    /// when served from cache).
    pub fetched_at: u64,
    /// Records for participants who completed the stage.
    pub records: Vec<ResponseRecord>,
    /// Anomaly counters and column presence from ingestion, before the
    /// completion filter.
    pub report: IngestReport,
}

impl StageSnapshot {
    /// Zero qualifying rows — a normal terminal display state, not an
    /// error.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Owns the provider and the snapshot cache; produces stage snapshots.
pub struct Refresher {
    provider: Box<dyn SheetProvider>,
    config: StudyConfig,
    cache: SnapshotCache,
}

impl Refresher {
    pub fn new(provider: Box<dyn SheetProvider>, config: StudyConfig) -> Self {
        let cache = SnapshotCache::new(config.refresh_interval_secs);
        Self {
            provider,
            config,
            cache,
        }
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// Current snapshot for a stage, fetching only when the cache interval
    /// has rolled over.
    pub fn snapshot(&mut self, stage: Stage) -> Result<StageSnapshot> {
        self.snapshot_at(stage, now_unix())
    }

    /// Like [`snapshot`](Self::snapshot) with an explicit clock, for tests.
    pub fn snapshot_at(&mut self, stage: Stage, now_unix: u64) -> Result<StageSnapshot> {
        let ingested = match self.cache.get(self.provider.name(), stage, now_unix) {
            Some(hit) => hit.clone(),
            None => {
                let fresh = self.fetch_and_ingest(stage)?;
                self.cache
                    .put(self.provider.name(), stage, now_unix, fresh.clone());
                fresh
            }
        };

        let records = retain_complete(&ingested.records, self.config.required_answers(stage));

        Ok(StageSnapshot {
            stage,
            fetched_at: now_unix,
            records,
            report: ingested.report,
        })
    }

    /// Stage 1 exposes the raw cell grid; stage 2 exposes labeled records.
    fn fetch_and_ingest(&self, stage: Stage) -> Result<studylab_core::data::IngestResult> {
        let ingestor = RowIngestor::new(stage);
        let result = match stage {
            Stage::One => {
                let grid = self
                    .provider
                    .fetch_grid(stage)
                    .with_context(|| format!("fetch {} rows", stage.label()))?;
                ingestor.ingest_grid(&grid)
            }
            Stage::Two => {
                let rows = self
                    .provider
                    .fetch_records(stage)
                    .with_context(|| format!("fetch {} rows", stage.label()))?;
                ingestor.ingest_records(&rows)
            }
        };
        Ok(result)
    }
}

/// Runs the fixed-interval refresh loop, invoking `on_cycle` with both
/// stage snapshots each tick.
///
/// `max_cycles = None` runs until the process is killed. Fetch failures
/// propagate out of the loop so the caller can surface a blocking,
/// retryable notice.
pub fn run_refresh_loop<F>(
    refresher: &mut Refresher,
    max_cycles: Option<usize>,
    mut on_cycle: F,
) -> Result<()>
where
    F: FnMut(&StageSnapshot, &StageSnapshot),
{
    let interval = Duration::from_secs(refresher.config.refresh_interval_secs);
    let mut cycle = 0usize;

    loop {
        let stage1 = refresher.snapshot(Stage::One)?;
        let stage2 = refresher.snapshot(Stage::Two)?;
        on_cycle(&stage1, &stage2);

        cycle += 1;
        if max_cycles.is_some_and(|max| cycle >= max) {
            return Ok(());
        }
        std::thread::sleep(interval);
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

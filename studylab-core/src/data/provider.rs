//! Sheet provider trait and structured error types.
//!
//! The SheetProvider trait abstracts over the tabular row source (remote
//! spreadsheet service, in-memory fixtures) so the pipeline can swap
//! implementations and mock for tests. The snapshot cache sits above this
//! trait — providers don't know about the cache.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

use crate::domain::Stage;

/// One worksheet as an ordered grid of string cells. Rows may be ragged.
pub type RawGrid = Vec<Vec<String>>;

/// One worksheet row as labeled cells (the record-oriented endpoint).
pub type LabeledRow = BTreeMap<String, String>;

/// Structured error types for source fetches.
///
/// Fetch failures are blocking and retryable at the boundary; no partial
/// data is ever shown. Row-level anomalies are not errors — they are
/// absorbed into the ingest report.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("source fetch failed: {0}")]
    FetchFailed(String),

    #[error("source request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("access to the spreadsheet was denied: {0}")]
    AccessDenied(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("worksheet not found: {name}")]
    WorksheetNotFound { name: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for row sources.
///
/// Both operations fetch a stage's table wholesale; there is no incremental
/// or streaming path. `fetch_grid` returns raw positional cells,
/// `fetch_records` returns labeled cells for sources that expose a
/// record-oriented view, which is how the stage-2 worksheet is served.
pub trait SheetProvider: Send + Sync {
    /// Human-readable name; also part of the snapshot cache key.
    fn name(&self) -> &str;

    fn fetch_grid(&self, stage: Stage) -> Result<RawGrid, DataError>;

    fn fetch_records(&self, stage: Stage) -> Result<Vec<LabeledRow>, DataError>;
}

impl<P: SheetProvider + ?Sized> SheetProvider for std::sync::Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_grid(&self, stage: Stage) -> Result<RawGrid, DataError> {
        (**self).fetch_grid(stage)
    }

    fn fetch_records(&self, stage: Stage) -> Result<Vec<LabeledRow>, DataError> {
        (**self).fetch_records(stage)
    }
}

/// In-memory provider for tests and offline use.
///
/// Counts fetches so cache/single-flight tests can assert the source was
/// hit exactly once per interval.
#[derive(Default)]
pub struct StaticProvider {
    grids: BTreeMap<&'static str, RawGrid>,
    records: BTreeMap<&'static str, Vec<LabeledRow>>,
    fetches: AtomicUsize,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grid(mut self, stage: Stage, grid: RawGrid) -> Self {
        self.grids.insert(stage.label(), grid);
        self
    }

    pub fn with_records(mut self, stage: Stage, records: Vec<LabeledRow>) -> Self {
        self.records.insert(stage.label(), records);
        self
    }

    /// Total number of fetch calls served.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl SheetProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch_grid(&self, stage: Stage) -> Result<RawGrid, DataError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self.grids.get(stage.label()).cloned().unwrap_or_default())
    }

    fn fetch_records(&self, stage: Stage) -> Result<Vec<LabeledRow>, DataError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self.records.get(stage.label()).cloned().unwrap_or_default())
    }
}

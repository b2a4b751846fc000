//! Data ingestion, providers, and snapshot caching.

pub mod cache;
pub mod ingest;
pub mod provider;
pub mod remote;
pub mod schema;

pub use cache::{snapshot_key, SnapshotCache};
pub use ingest::{IngestReport, IngestResult, RowIngestor};
pub use provider::{DataError, LabeledRow, RawGrid, SheetProvider, StaticProvider};
pub use remote::RemoteSheetProvider;
pub use schema::{ColumnReport, SchemaMapping, SheetSchema};

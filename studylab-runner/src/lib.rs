//! StudyLab Runner — refresh orchestration, stage reports, CSV export.

pub mod config;
pub mod export;
pub mod refresh;
pub mod report;

pub use config::{SourceConfig, StudyConfig};
pub use export::write_records_csv;
pub use refresh::{run_refresh_loop, Refresher, StageSnapshot};
pub use report::{
    build_cross_stage, build_stage_view, CrossStageReport, StageReport, StageView,
};

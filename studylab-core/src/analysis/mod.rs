//! Analysis stages: completion filtering, aggregation, first-exposure
//! selection, cross-stage reconciliation.

pub mod aggregate;
pub mod completion;
pub mod first_exposure;
pub mod reconcile;

pub use aggregate::{aggregate_by, latency_quantile, totals, AggregationOptions, Totals};
pub use completion::retain_complete;
pub use first_exposure::{first_exposures, StimulusKey};
pub use reconcile::{
    pooled_accuracy_by, reconcile, ComparisonRow, StageAccuracy, StageComparison,
};

//! StudyLab Core — the survey-response analytics pipeline.
//!
//! This crate contains the heart of the reporting system:
//! - Domain types (response records, stat rows, filter criteria)
//! - Per-stage sheet schemas with an explicit field mapping
//! - The sheet provider trait and the remote HTTP provider
//! - Row ingestion with lenient coercion and anomaly counting
//! - Completion filtering, grouped aggregation, first-exposure selection
//! - Cross-stage reconciliation with sample-weighted pooling
//! - A TTL snapshot cache keyed by fetch epoch bucket

pub mod analysis;
pub mod data;
pub mod domain;

//! Domain types: response records, aggregated stat rows, filter criteria.

pub mod criteria;
pub mod record;
pub mod stat;

pub use criteria::FilterCriteria;
pub use record::{parse_correct, ResponseRecord, Stage};
pub use stat::{flag_max, StatRow};

//! Snapshot cache — explicit TTL memoization of ingested stage tables.
//!
//! Key = blake3 of (provider name, stage, fetch epoch bucket). Entries from
//! older buckets are swept on insert, so a bucket rollover is an explicit
//! expiry check rather than hidden decorator state. Within one interval,
//! repeated aggregation requests reuse the same ingested table instead of
//! re-fetching the source.

use std::collections::HashMap;

use super::ingest::IngestResult;
use crate::domain::Stage;

/// Content key for one cached snapshot.
pub fn snapshot_key(provider: &str, stage: Stage, bucket: u64) -> String {
    let hash = blake3::hash(format!("{provider}:{}:{bucket}", stage.label()).as_bytes());
    hash.to_hex().to_string()
}

struct Entry {
    bucket: u64,
    result: IngestResult,
}

/// TTL cache of ingested tables.
pub struct SnapshotCache {
    ttl_secs: u64,
    entries: HashMap<String, Entry>,
}

impl SnapshotCache {
    /// A zero TTL degenerates to one bucket per second, i.e. effectively no
    /// caching across cycles.
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs: ttl_secs.max(1),
            entries: HashMap::new(),
        }
    }

    /// Fetch epoch bucket for a wall-clock instant (unix seconds).
    pub fn bucket(&self, now_unix: u64) -> u64 {
        now_unix / self.ttl_secs
    }

    pub fn get(&self, provider: &str, stage: Stage, now_unix: u64) -> Option<&IngestResult> {
        let bucket = self.bucket(now_unix);
        let key = snapshot_key(provider, stage, bucket);
        self.entries
            .get(&key)
            .filter(|e| e.bucket == bucket)
            .map(|e| &e.result)
    }

    pub fn put(&mut self, provider: &str, stage: Stage, now_unix: u64, result: IngestResult) {
        let bucket = self.bucket(now_unix);
        // Sweep expired buckets before inserting.
        self.entries.retain(|_, e| e.bucket == bucket);
        let key = snapshot_key(provider, stage, bucket);
        self.entries.insert(key, Entry { bucket, result });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ingest::RowIngestor;

    fn sample_result() -> IngestResult {
        RowIngestor::new(Stage::One).ingest_grid(&[])
    }

    #[test]
    fn hit_within_interval_miss_after() {
        let mut cache = SnapshotCache::new(30);
        cache.put("static", Stage::One, 1_000, sample_result());

        // Same bucket: 1000/30 == 1010/30
        assert!(cache.get("static", Stage::One, 1_010).is_some());
        // Next bucket
        assert!(cache.get("static", Stage::One, 1_020).is_none());
    }

    #[test]
    fn stages_and_providers_key_separately() {
        let mut cache = SnapshotCache::new(30);
        cache.put("static", Stage::One, 1_000, sample_result());

        assert!(cache.get("static", Stage::Two, 1_000).is_none());
        assert!(cache.get("remote", Stage::One, 1_000).is_none());
    }

    #[test]
    fn put_sweeps_expired_entries() {
        let mut cache = SnapshotCache::new(30);
        cache.put("static", Stage::One, 1_000, sample_result());
        cache.put("static", Stage::Two, 2_000, sample_result());

        assert_eq!(cache.len(), 1);
        assert!(cache.get("static", Stage::One, 2_000).is_none());
        assert!(cache.get("static", Stage::Two, 2_000).is_some());
    }
}

use crate::{Clock, Fingerprint, SystemClock};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use liveops_core::SummaryResult;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Validity window of a cached summary, measured from creation.
pub const SUMMARY_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Cache entry metadata
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub value: T,
    pub created_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, created_at: DateTime<Utc>) -> Self {
        Self { value, created_at }
    }

    /// Time since creation; zero if `now` precedes `created_at`.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// `now - created_at < ttl`
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

/// Cache access counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub reads: u64,
    pub writes: u64,
    pub entries: usize,
}

/// Process-lifetime store of summaries keyed by batch fingerprint.
///
/// The store never evicts or purges. `get` returns whatever was stored, stale or
/// not; deciding whether an entry is still usable is left to the caller via
/// [`CacheEntry::is_fresh`] and [`SummaryCache::ttl`]. There is no capacity bound.
///
/// Reads and writes are safe from concurrent tasks. Two tasks racing on the same
/// fingerprint may both compute and the last `put` wins.
pub struct SummaryCache {
    entries: DashMap<Fingerprint, CacheEntry<SummaryResult>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl SummaryCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: SUMMARY_CACHE_TTL,
            clock,
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current time according to the cache's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn get(&self, key: &Fingerprint) -> Option<CacheEntry<SummaryResult>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let entry = self.entries.get(key).map(|e| e.value().clone());
        trace!(key = %key, found = entry.is_some(), "summary cache read");
        entry
    }

    /// Insert or overwrite the entry for `key`.
    pub fn put(&self, key: Fingerprint, result: SummaryResult, now: DateTime<Utc>) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        trace!(key = %key, "summary cache write");
        self.entries.insert(key, CacheEntry::new(result, now));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

impl Default for SummaryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SummaryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryCache")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use liveops_core::{ReviewBatch, ReviewRecord};

    fn key(text: &str) -> Fingerprint {
        let batch = ReviewBatch::new(vec![ReviewRecord::from_text(text)]).unwrap();
        Fingerprint::from_batch(&batch)
    }

    fn result(line: &str) -> SummaryResult {
        SummaryResult {
            problems: vec![],
            summary_line: line.to_string(),
            total_analyzed: 1,
        }
    }

    #[test]
    fn entry_freshness_is_strictly_less_than_ttl() {
        let clock = ManualClock::default();
        let entry = CacheEntry::new((), clock.now());
        assert!(entry.is_fresh(clock.now(), SUMMARY_CACHE_TTL));

        clock.advance(SUMMARY_CACHE_TTL - Duration::from_secs(1));
        assert!(entry.is_fresh(clock.now(), SUMMARY_CACHE_TTL));

        clock.advance(Duration::from_secs(1));
        assert!(!entry.is_fresh(clock.now(), SUMMARY_CACHE_TTL));
    }

    #[test]
    fn stale_entries_are_still_returned() {
        let clock = ManualClock::default();
        let cache = SummaryCache::with_clock(Arc::new(clock.clone()));
        cache.put(key("a"), result("first"), cache.now());

        clock.advance(Duration::from_secs(3600));
        let entry = cache.get(&key("a")).unwrap();
        assert_eq!(entry.value.summary_line, "first");
        assert!(!entry.is_fresh(cache.now(), cache.ttl()));
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let cache = SummaryCache::new();
        cache.put(key("a"), result("first"), cache.now());
        cache.put(key("a"), result("second"), cache.now());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key("a")).unwrap().value.summary_line, "second");
    }

    #[test]
    fn stats_count_reads_and_writes() {
        let cache = SummaryCache::new();
        assert!(cache.get(&key("missing")).is_none());
        cache.put(key("a"), result("x"), cache.now());
        assert_eq!(
            cache.stats(),
            CacheStats {
                reads: 1,
                writes: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn future_timestamps_count_as_fresh() {
        let clock = ManualClock::default();
        let entry = CacheEntry::new((), clock.now() + chrono::Duration::seconds(30));
        assert_eq!(entry.age(clock.now()), Duration::ZERO);
        assert!(entry.is_fresh(clock.now(), SUMMARY_CACHE_TTL));
    }
}

/// Single-slot TTL cache for the Narvesen store list.
///
/// The store list changes rarely and the page is slow and large, so the
/// last successful extraction is kept for a day. There is exactly one entry
/// per process.
///
/// **Flow:**
/// 1. Lock, check freshness, clone the `Arc` out if fresh, unlock
/// 2. On a miss, fetch *without* the lock held
/// 3. On success, lock again and replace the entry whole
///
/// Concurrent misses each fetch (no coalescing); the last one to finish
/// wins. A failed fetch leaves any stale entry in place but is still
/// reported to the caller; stale data is not served on error.

use crate::model::StoreRecord;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Time source, injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CacheEntry {
    records: Arc<Vec<StoreRecord>>,
    fetched_at: DateTime<Utc>,
}

pub struct StoreCache {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    slot: Mutex<Option<CacheEntry>>,
}

impl StoreCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Cache on the wall clock.
    pub fn with_system_clock(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Readers only ever copy an `Arc` out, so a panic while the lock is
    /// held cannot leave a half-written entry behind.
    fn lock(&self) -> MutexGuard<'_, Option<CacheEntry>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The cached records if they are younger than the TTL.
    pub fn get_fresh(&self) -> Option<Arc<Vec<StoreRecord>>> {
        let now = self.clock.now();
        let slot = self.lock();
        slot.as_ref()
            .filter(|entry| now - entry.fetched_at < self.ttl)
            .map(|entry| Arc::clone(&entry.records))
    }

    /// Replaces the entry, stamped with the current time.
    pub fn store(&self, records: Vec<StoreRecord>) -> Arc<Vec<StoreRecord>> {
        let records = Arc::new(records);
        let entry = CacheEntry {
            records: Arc::clone(&records),
            fetched_at: self.clock.now(),
        };
        *self.lock() = Some(entry);
        records
    }

    /// Age of the current entry, fresh or not.
    pub fn age(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.lock().as_ref().map(|entry| now - entry.fetched_at)
    }

    /// Returns the cached records, or runs `fetch` and caches its result.
    ///
    /// The lock is not held while `fetch` runs. Errors from `fetch` are
    /// returned as-is and never touch the cached entry.
    pub fn get_or_fetch<F, E>(&self, fetch: F) -> Result<Arc<Vec<StoreRecord>>, E>
    where
        F: FnOnce() -> Result<Vec<StoreRecord>, E>,
    {
        if let Some(records) = self.get_fresh() {
            log::debug!("Store cache hit ({} records)", records.len());
            return Ok(records);
        }

        log::debug!("Store cache miss, fetching");
        let records = fetch()?;
        Ok(self.store(records))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

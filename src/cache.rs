//! Snapshot cache for channel video listings.
//!
//! A snapshot is the first page of a channel's uploads for one requested
//! count, stored whole together with the time it was fetched. Backends only
//! store and load entries; [`SnapshotCache`] applies the freshness window on
//! read and turns backend failures into misses so a broken cache never fails
//! a request.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::CacheError;
use crate::models::VideoSummary;

pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(60 * 60);

/// Source of the current time, replaceable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub channel_id: String,
    pub limit: u32,
}

impl CacheKey {
    pub fn new(channel_id: impl Into<String>, limit: u32) -> Self {
        Self {
            channel_id: channel_id.into(),
            limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub videos: Vec<VideoSummary>,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>, window: TimeDelta) -> bool {
        now.signed_duration_since(self.fetched_at) < window
    }
}

/// Storage for whole snapshots. `store` must replace any previous entry for
/// the key in one step; readers see either the old entry or the new one.
pub trait SnapshotBackend: Send + Sync {
    fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError>;
    fn store(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), CacheError>;

    /// Drops the entry for `key` if it is still the one fetched at
    /// `fetched_at`. A newer entry stored in the meantime is left alone.
    fn evict(&self, key: &CacheKey, fetched_at: DateTime<Utc>) -> Result<(), CacheError>;
}

/// Process-local snapshots behind a read/write lock. Stale entries are
/// evicted when a read finds them, so the map holds at most one entry per
/// key that has been requested within the freshness window, plus keys that
/// expired without being asked for again.
#[derive(Debug, Default)]
pub struct MemorySnapshots {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl MemorySnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl SnapshotBackend for MemorySnapshots {
    fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn store(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), CacheError> {
        self.entries.write().insert(key.clone(), entry.clone());
        Ok(())
    }

    fn evict(&self, key: &CacheKey, fetched_at: DateTime<Utc>) -> Result<(), CacheError> {
        let mut entries = self.entries.write();
        if entries
            .get(key)
            .is_some_and(|entry| entry.fetched_at == fetched_at)
        {
            entries.remove(key);
        }
        Ok(())
    }
}

/// Used when no cache is configured: nothing is ever found, writes vanish.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSnapshots;

impl SnapshotBackend for NoSnapshots {
    fn load(&self, _key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        Ok(None)
    }

    fn store(&self, _key: &CacheKey, _entry: &CacheEntry) -> Result<(), CacheError> {
        Ok(())
    }

    fn evict(&self, _key: &CacheKey, _fetched_at: DateTime<Utc>) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Backend plus freshness policy.
#[derive(Clone)]
pub struct SnapshotCache {
    backend: Arc<dyn SnapshotBackend>,
    clock: Arc<dyn Clock>,
    freshness: TimeDelta,
}

impl SnapshotCache {
    pub fn new(backend: Arc<dyn SnapshotBackend>, freshness: Duration) -> Self {
        Self::with_clock(backend, freshness, Arc::new(SystemClock))
    }

    pub fn with_clock(
        backend: Arc<dyn SnapshotBackend>,
        freshness: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let freshness = TimeDelta::from_std(freshness).unwrap_or(TimeDelta::MAX);
        Self {
            backend,
            clock,
            freshness,
        }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(NoSnapshots), DEFAULT_FRESHNESS)
    }

    /// Returns the snapshot for `key` if one exists and is still fresh. A
    /// stale snapshot is evicted on the way out.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = match self.backend.load(key) {
            Ok(entry) => entry?,
            Err(err) => {
                warn!(channel = %key.channel_id, limit = key.limit, "cache read failed: {err}");
                return None;
            }
        };

        if entry.is_fresh(self.clock.now(), self.freshness) {
            Some(entry)
        } else {
            debug!(channel = %key.channel_id, limit = key.limit, fetched_at = %entry.fetched_at, "snapshot expired");
            if let Err(err) = self.backend.evict(key, entry.fetched_at) {
                warn!(channel = %key.channel_id, limit = key.limit, "cache eviction failed: {err}");
            }
            None
        }
    }

    /// Replaces the snapshot for `key`. Failures are logged and ignored.
    pub fn put(&self, key: &CacheKey, videos: &[VideoSummary]) {
        let entry = CacheEntry {
            videos: videos.to_vec(),
            fetched_at: self.clock.now(),
        };
        if let Err(err) = self.backend.store(key, &entry) {
            warn!(channel = %key.channel_id, limit = key.limit, "cache write failed: {err}");
        }
    }
}

// src/cache.rs
//! # Score Cache
//! Process-lifetime TTL cache of composite results, keyed by normalized subject.
//!
//! - Absolute TTL per entry (no sliding refresh); default 24h.
//! - Expiry is lazy: an expired entry is evicted on the read that finds it.
//! - Backed by a sharded map, so reads/writes on different subjects do not
//!   contend on a single lock.
//! - The time source is injectable (`Clock`) so TTL boundaries are testable.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use metrics::counter;
use serde::Serialize;

use crate::model::CompositeResult;
use crate::subject::Subject;

pub const DEFAULT_TTL_SECS: u64 = 86_400;

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut g = self.now.lock().expect("manual clock mutex poisoned");
        *g = advance_saturating(*g, by);
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().expect("manual clock mutex poisoned") = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("manual clock mutex poisoned")
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CompositeResult,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Live (unexpired) entries.
    pub entry_count: usize,
    /// Expired entries not yet evicted.
    pub expired_entries: usize,
    pub oldest_entry_age_secs: Option<u64>,
    pub configured_ttl_secs: u64,
}

pub struct ScoreCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ScoreCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current time as seen by this cache's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Live entry for `subject`, or `None`. Expired entries are evicted here.
    pub fn get(&self, subject: &Subject) -> Option<CompositeResult> {
        let now = self.clock.now();
        match self.entries.get(subject.key()) {
            None => {
                counter!("likability_cache_misses_total").increment(1);
                return None;
            }
            Some(entry) if entry.is_live(now) => {
                counter!("likability_cache_hits_total").increment(1);
                return Some(entry.value.clone());
            }
            Some(_) => {}
        }

        // Shard guard is released above; re-check under the write lock so a
        // concurrent fresh `set` is not evicted.
        self.entries
            .remove_if(subject.key(), |_, e| !e.is_live(now));
        counter!("likability_cache_misses_total").increment(1);
        None
    }

    /// Insert or overwrite with the configured TTL.
    pub fn set(&self, subject: &Subject, value: CompositeResult) {
        self.set_with_ttl(subject, value, self.ttl);
    }

    pub fn set_with_ttl(&self, subject: &Subject, value: CompositeResult, ttl: Duration) {
        let now = self.clock.now();
        let entry = CacheEntry {
            value,
            created_at: now,
            expires_at: advance_saturating(now, ttl),
        };
        self.entries.insert(subject.key().to_string(), entry);
    }

    /// Remove one subject. Returns true if an entry existed.
    pub fn delete(&self, subject: &Subject) -> bool {
        self.entries.remove(subject.key()).is_some()
    }

    /// Remove everything. Returns the number of entries removed.
    pub fn clear(&self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    /// Evict all expired entries. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, e| e.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let mut live = 0usize;
        let mut expired = 0usize;
        let mut oldest: Option<u64> = None;

        for item in self.entries.iter() {
            let e = item.value();
            if e.is_live(now) {
                live += 1;
                let age = (now - e.created_at).num_seconds().max(0) as u64;
                oldest = Some(oldest.map_or(age, |o| o.max(age)));
            } else {
                expired += 1;
            }
        }

        CacheStats {
            entry_count: live,
            expired_entries: expired,
            oldest_entry_age_secs: oldest,
            configured_ttl_secs: self.ttl.as_secs(),
        }
    }
}

/// `at + by`, pinned to the latest representable instant on overflow.
fn advance_saturating(at: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(by)
        .ok()
        .and_then(|d| at.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory counter cache for Warden.
//
// Uses a `HashMap` wrapped in a tokio `RwLock`. An entry whose deadline has
// passed reads as absent. Dead entries are dropped when touched, and every
// `SWEEP_INTERVAL` writes a full sweep removes the rest, so a stream of
// distinct keys cannot grow the map past what is live plus one interval.
// Deadlines use `tokio::time::Instant` so tests can pause and advance the
// clock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::backend::CounterCache;
use crate::error::CacheError;

/// Longest key accepted, matching common hosted-cache limits.
pub const MAX_KEY_LEN: usize = 512;

/// Writes between full sweeps of expired entries.
pub const SWEEP_INTERVAL: u64 = 256;

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: u64,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| now < deadline)
    }
}

/// An in-memory counter cache with per-key TTL.
///
/// All data lives in process memory and is lost on drop. Clones share state.
///
/// # Example
///
/// ```rust
/// use warden_cache::memory::InMemoryCache;
/// use warden_cache::backend::CounterCache;
///
/// # tokio_test::block_on(async {
/// let cache = InMemoryCache::new();
/// assert_eq!(cache.increment("k").await.unwrap(), 1);
/// assert_eq!(cache.increment("k").await.unwrap(), 2);
/// assert_eq!(cache.get("k").await.unwrap(), Some(2));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryCache {
    data: Arc<RwLock<HashMap<String, Entry>>>,
    writes: Arc<AtomicU64>,
}

impl InMemoryCache {
    /// Create a new, empty cache.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            writes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of keys whose TTL has not elapsed.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.data
            .read()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    /// Return true if no live keys remain.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Time left before `key` expires. `None` for absent keys and keys
    /// without a TTL.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let map = self.data.read().await;
        map.get(key)
            .filter(|e| e.is_live(now))
            .and_then(|e| e.expires_at)
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Drop every expired entry now. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut map = self.data.write().await;
        Self::sweep(&mut map, now)
    }

    fn sweep(map: &mut HashMap<String, Entry>, now: Instant) -> usize {
        let before = map.len();
        map.retain(|_, e| e.is_live(now));
        let removed = before - map.len();
        if removed > 0 {
            debug!(removed, remaining = map.len(), "Swept expired cache entries");
        }
        removed
    }

    /// Count a write and sweep when the interval is reached.
    fn note_write(&self, map: &mut HashMap<String, Entry>, now: Instant) {
        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            Self::sweep(map, now);
        }
    }

    fn deadline(now: Instant, ttl: Duration) -> Result<Instant, CacheError> {
        now.checked_add(ttl).ok_or(CacheError::InvalidTtl(ttl))
    }

    fn check_key(key: &str) -> Result<(), CacheError> {
        if key.len() > MAX_KEY_LEN {
            return Err(CacheError::KeyTooLarge {
                size: key.len(),
                max: MAX_KEY_LEN,
            });
        }
        Ok(())
    }

    fn bump(map: &mut HashMap<String, Entry>, key: &str, now: Instant) -> u64 {
        let entry = map.entry(key.to_string()).or_insert(Entry {
            value: 0,
            expires_at: None,
        });
        if !entry.is_live(now) {
            *entry = Entry {
                value: 0,
                expires_at: None,
            };
        }
        entry.value = entry.value.saturating_add(1);
        entry.value
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterCache for InMemoryCache {
    async fn increment(&self, key: &str) -> Result<u64, CacheError> {
        Self::check_key(key)?;
        let now = Instant::now();
        let mut map = self.data.write().await;
        let value = Self::bump(&mut map, key, now);
        self.note_write(&mut map, now);
        Ok(value)
    }

    async fn get(&self, key: &str) -> Result<Option<u64>, CacheError> {
        Self::check_key(key)?;
        let now = Instant::now();
        {
            let map = self.data.read().await;
            match map.get(key) {
                None => return Ok(None),
                Some(e) if e.is_live(now) => return Ok(Some(e.value)),
                Some(_) => {}
            }
        }
        // Expired: drop it unless a writer revived it in between.
        let mut map = self.data.write().await;
        if map.get(key).is_some_and(|e| !e.is_live(now)) {
            map.remove(key);
        }
        Ok(map.get(key).map(|e| e.value))
    }

    async fn set_expiry(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        Self::check_key(key)?;
        let now = Instant::now();
        let deadline = Self::deadline(now, ttl)?;
        let mut map = self.data.write().await;
        match map.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                entry.expires_at = Some(deadline);
                Ok(true)
            }
            Some(_) => {
                map.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Self::check_key(key)?;
        let now = Instant::now();
        let mut map = self.data.write().await;
        Ok(map.remove(key).is_some_and(|e| e.is_live(now)))
    }

    async fn increment_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64, CacheError> {
        Self::check_key(key)?;
        let now = Instant::now();
        let deadline = Self::deadline(now, ttl)?;
        let mut map = self.data.write().await;
        let value = Self::bump(&mut map, key, now);
        if let Some(entry) = map.get_mut(key) {
            entry.expires_at = Some(deadline);
        }
        self.note_write(&mut map, now);
        Ok(value)
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

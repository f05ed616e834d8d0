// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metrics-collecting wrapper for Warden counter caches.
//
// Wraps any `CounterCache` and transparently collects operation counts,
// failure counts and latency sums, so dashboards can tell a brute-force
// spike from a cache outage.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::CounterCache;
use crate::error::CacheError;

/// Accumulated statistics for a counter cache.
///
/// All counters are monotonically increasing for the lifetime of the
/// [`MetricsCache`] that owns them.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of increment operations (plain or with expiry).
    pub increment_count: u64,
    /// Number of `get` operations performed.
    pub get_count: u64,
    /// Number of `set_expiry` operations performed.
    pub expire_count: u64,
    /// Number of `delete` operations performed.
    pub delete_count: u64,
    /// Number of operations that returned an error.
    pub error_count: u64,
    /// Cumulative wall-clock latency of all operations, in milliseconds.
    pub latency_sum_ms: f64,
}

#[derive(Clone, Copy)]
enum Op {
    Increment,
    Get,
    Expire,
    Delete,
}

/// A counter cache wrapper that collects operation metrics.
///
/// # Example
///
/// ```rust
/// use warden_cache::memory::InMemoryCache;
/// use warden_cache::metrics::MetricsCache;
/// use warden_cache::backend::CounterCache;
///
/// # tokio_test::block_on(async {
/// let metered = MetricsCache::new(InMemoryCache::new());
/// metered.increment("k").await.unwrap();
/// metered.get("k").await.unwrap();
///
/// let stats = metered.stats().await;
/// assert_eq!(stats.increment_count, 1);
/// assert_eq!(stats.get_count, 1);
/// # });
/// ```
pub struct MetricsCache<C: CounterCache> {
    inner: C,
    stats: Arc<RwLock<CacheStats>>,
}

impl<C: CounterCache> MetricsCache<C> {
    /// Wrap `inner` with metrics collection.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            stats: Arc::new(RwLock::new(CacheStats::default())),
        }
    }

    /// Return a snapshot of the current statistics.
    pub async fn stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    /// Reset all statistics to zero.
    pub async fn reset_stats(&self) {
        let mut s = self.stats.write().await;
        *s = CacheStats::default();
    }

    /// Return a reference to the inner cache.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    async fn observe<T>(&self, op: Op, elapsed: Duration, result: &Result<T, CacheError>) {
        let mut s = self.stats.write().await;
        match op {
            Op::Increment => s.increment_count += 1,
            Op::Get => s.get_count += 1,
            Op::Expire => s.expire_count += 1,
            Op::Delete => s.delete_count += 1,
        }
        if result.is_err() {
            s.error_count += 1;
        }
        s.latency_sum_ms += elapsed.as_secs_f64() * 1000.0;
    }
}

#[async_trait]
impl<C: CounterCache> CounterCache for MetricsCache<C> {
    async fn increment(&self, key: &str) -> Result<u64, CacheError> {
        let start = Instant::now();
        let result = self.inner.increment(key).await;
        self.observe(Op::Increment, start.elapsed(), &result).await;
        result
    }

    async fn get(&self, key: &str) -> Result<Option<u64>, CacheError> {
        let start = Instant::now();
        let result = self.inner.get(key).await;
        self.observe(Op::Get, start.elapsed(), &result).await;
        result
    }

    async fn set_expiry(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        let start = Instant::now();
        let result = self.inner.set_expiry(key, ttl).await;
        self.observe(Op::Expire, start.elapsed(), &result).await;
        result
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let start = Instant::now();
        let result = self.inner.delete(key).await;
        self.observe(Op::Delete, start.elapsed(), &result).await;
        result
    }

    async fn increment_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64, CacheError> {
        let start = Instant::now();
        let result = self.inner.increment_with_expiry(key, ttl).await;
        self.observe(Op::Increment, start.elapsed(), &result).await;
        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::FaultyCache;
    use crate::memory::InMemoryCache;

    #[tokio::test]
    async fn test_counts_each_operation() {
        let metered = MetricsCache::new(InMemoryCache::new());

        metered.increment("k").await.unwrap();
        metered
            .increment_with_expiry("k", Duration::from_secs(5))
            .await
            .unwrap();
        metered.get("k").await.unwrap();
        metered.get("missing").await.unwrap();
        metered.set_expiry("k", Duration::from_secs(5)).await.unwrap();
        metered.delete("k").await.unwrap();

        let stats = metered.stats().await;
        assert_eq!(stats.increment_count, 2);
        assert_eq!(stats.get_count, 2);
        assert_eq!(stats.expire_count, 1);
        assert_eq!(stats.delete_count, 1);
        assert_eq!(stats.error_count, 0);
    }

    #[tokio::test]
    async fn test_counts_errors() {
        let faulty = FaultyCache::new(InMemoryCache::new());
        faulty.set_unavailable(true);
        let metered = MetricsCache::new(faulty);

        assert!(metered.increment("k").await.is_err());
        assert!(metered.get("k").await.is_err());

        let stats = metered.stats().await;
        assert_eq!(stats.increment_count, 1);
        assert_eq!(stats.get_count, 1);
        assert_eq!(stats.error_count, 2);
    }

    #[tokio::test]
    async fn test_reset_stats() {
        let metered = MetricsCache::new(InMemoryCache::new());
        metered.increment("k").await.unwrap();
        metered.reset_stats().await;
        assert_eq!(metered.stats().await.increment_count, 0);
        // The data itself is untouched.
        assert_eq!(metered.inner().get("k").await.unwrap(), Some(1));
    }

    #[test]
    fn test_name_delegates() {
        let metered = MetricsCache::new(InMemoryCache::new());
        assert_eq!(metered.name(), "in-memory");
    }
}

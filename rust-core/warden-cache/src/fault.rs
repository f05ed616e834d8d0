// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fault-injecting wrapper for Warden counter caches.
//
// Lets tests and staging environments simulate a cache outage or a slow
// cache without touching the real collaborator.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::backend::CounterCache;
use crate::error::CacheError;

/// A counter cache wrapper that can be switched into an outage or given
/// artificial latency at runtime. Clones share the switches.
#[derive(Debug, Clone)]
pub struct FaultyCache<C: CounterCache> {
    inner: Arc<C>,
    unavailable: Arc<AtomicBool>,
    latency_ms: Arc<AtomicU64>,
}

impl<C: CounterCache> FaultyCache<C> {
    /// Wrap `inner`; initially healthy with no added latency.
    pub fn new(inner: C) -> Self {
        Self {
            inner: Arc::new(inner),
            unavailable: Arc::new(AtomicBool::new(false)),
            latency_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Make every subsequent call fail with [`CacheError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        debug!(cache = %self.inner.name(), unavailable, "Cache outage switch");
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every subsequent call by `latency` before answering.
    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(ms, Ordering::SeqCst);
    }

    /// Return a reference to the inner cache.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    async fn gate(&self) -> Result<(), CacheError> {
        let ms = self.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            warn!(cache = %self.inner.name(), "Injected cache outage");
            return Err(CacheError::Unavailable(format!(
                "{} (injected outage)",
                self.inner.name()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<C: CounterCache> CounterCache for FaultyCache<C> {
    async fn increment(&self, key: &str) -> Result<u64, CacheError> {
        self.gate().await?;
        self.inner.increment(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<u64>, CacheError> {
        self.gate().await?;
        self.inner.get(key).await
    }

    async fn set_expiry(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        self.gate().await?;
        self.inner.set_expiry(key, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.gate().await?;
        self.inner.delete(key).await
    }

    async fn increment_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64, CacheError> {
        self.gate().await?;
        self.inner.increment_with_expiry(key, ttl).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCache;

    #[tokio::test]
    async fn test_outage_toggles() {
        let cache = FaultyCache::new(InMemoryCache::new());
        cache.increment("k").await.unwrap();

        cache.set_unavailable(true);
        let err = cache.get("k").await.unwrap_err();
        assert!(err.is_unavailable());

        cache.set_unavailable(false);
        assert_eq!(cache.get("k").await.unwrap(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_applied() {
        let cache = FaultyCache::new(InMemoryCache::new());
        cache.set_latency(Duration::from_secs(2));

        let slow = tokio::time::timeout(Duration::from_secs(1), cache.increment("k")).await;
        assert!(slow.is_err(), "call should exceed the 1s deadline");

        cache.set_latency(Duration::ZERO);
        assert_eq!(cache.increment("k").await.unwrap(), 1);
    }
}

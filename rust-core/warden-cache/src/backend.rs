// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core counter cache trait for Warden.
//
// Defines the `CounterCache` trait that every cache client must satisfy.
// Counters are unsigned integers keyed by strings. Expiry is native to the
// cache: once a key's TTL elapses the key reads as absent, and the next
// increment starts again from one.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;

/// An external key-value cache holding integer counters with per-key TTL.
///
/// `increment` must be atomic with respect to concurrent callers: two
/// concurrent increments of the same key always produce two distinct
/// results. Callers never perform read-modify-write themselves.
///
/// Implementations must be safe to share across threads and tokio tasks.
#[async_trait]
pub trait CounterCache: Send + Sync {
    /// Atomically increment the counter stored at `key` and return the new
    /// value. An absent (or expired) key is treated as zero.
    async fn increment(&self, key: &str) -> Result<u64, CacheError>;

    /// Read the counter at `key`. Returns `Ok(None)` if the key is absent or
    /// its TTL has elapsed.
    async fn get(&self, key: &str) -> Result<Option<u64>, CacheError>;

    /// (Re)set the TTL of `key`. Returns `Ok(false)` when the key does not exist.
    async fn set_expiry(&self, key: &str, ttl: Duration) -> Result<bool, CacheError>;

    /// Remove `key`. Returns `Ok(true)` if the key existed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Increment `key` and (re)set its TTL.
    ///
    /// The default issues the two calls back to back, which is what a
    /// pipelined `INCR` + `EXPIRE` does. Implementations that can perform both
    /// under one lock or one transaction should override it.
    async fn increment_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64, CacheError> {
        let value = self.increment(key).await?;
        self.set_expiry(key, ttl).await?;
        Ok(value)
    }

    /// A human-readable name for this cache, used in logging and metrics.
    fn name(&self) -> &str;
}

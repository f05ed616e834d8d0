// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Warden Counter Cache Abstraction
//
// This crate provides the key-value cache contract that Warden's lockout
// tracker depends on. The cache is an external collaborator (typically a
// Redis-like store); the `CounterCache` trait captures the three operations
// the tracker needs: atomic increment, read, and per-key expiry.
//
// # Modules
//
// - [`backend`] -- The `CounterCache` trait.
// - [`error`] -- The `CacheError` enum covering all collaborator failures.
// - [`memory`] -- An in-memory `HashMap`-based cache with lazy TTL expiry,
//   for tests, development and single-process deployments.
// - [`metrics`] -- A transparent wrapper that collects operation statistics.
// - [`fault`] -- A wrapper that injects outages and latency, used to exercise
//   fail-open / fail-closed handling.
//
// # Example
//
// ```rust
// use std::time::Duration;
// use warden_cache::backend::CounterCache;
// use warden_cache::memory::InMemoryCache;
// use warden_cache::metrics::MetricsCache;
//
// # tokio_test::block_on(async {
// let cache = MetricsCache::new(InMemoryCache::new());
// let n = cache
//     .increment_with_expiry("failed_attempts:user:u1", Duration::from_secs(900))
//     .await
//     .unwrap();
// assert_eq!(n, 1);
// assert_eq!(cache.get("failed_attempts:user:u1").await.unwrap(), Some(1));
// assert_eq!(cache.stats().await.increment_count, 1);
// # });
// ```

pub mod backend;
pub mod error;
pub mod fault;
pub mod memory;
pub mod metrics;

pub use backend::CounterCache;
pub use error::CacheError;
pub use fault::FaultyCache;
pub use memory::InMemoryCache;
pub use metrics::{CacheStats, MetricsCache};

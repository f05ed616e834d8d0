// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Failed-authentication tracking.
//!
//! Every failure increments two independent counters in the external cache:
//!
//! - `failed_attempts:user:<user_id>`
//! - `failed_attempts:origin:<origin_id>`
//!
//! Each increment restarts that key's TTL, so a counter disappears after a
//! full window without failures. A pair is locked when *either* counter has
//! reached the threshold. A successful login clears only the user counter;
//! the origin counter is left alone because a shared origin may still be
//! attacking other accounts.
//!
//! The tracker holds no state of its own between calls. All expiry is the
//! cache's TTL; there is no background sweep.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use warden_cache::{CacheError, CounterCache};

use crate::config::{FailureMode, LockoutConfig};
use crate::error::LockoutError;

const USER_PREFIX: &str = "failed_attempts:user:";
const ORIGIN_PREFIX: &str = "failed_attempts:origin:";

/// Where a (user, origin) pair stands against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LockoutState {
    /// No recorded failures.
    Clear,
    /// Some failures, below the threshold.
    Warning { attempts: u64, remaining: u64 },
    /// Threshold reached on the user or origin counter.
    Locked,
}

impl LockoutState {
    fn from_attempts(attempts: u64, threshold: u64) -> Self {
        if attempts == 0 {
            LockoutState::Clear
        } else if attempts >= threshold {
            LockoutState::Locked
        } else {
            LockoutState::Warning {
                attempts,
                remaining: threshold - attempts,
            }
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, LockoutState::Locked)
    }
}

/// Dual-key lockout tracker over a shared [`CounterCache`].
#[derive(Clone)]
pub struct LockoutTracker {
    cache: Arc<dyn CounterCache>,
    config: LockoutConfig,
}

impl std::fmt::Debug for LockoutTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockoutTracker")
            .field("cache", &self.cache.name())
            .field("config", &self.config)
            .finish()
    }
}

impl LockoutTracker {
    /// Create a tracker.
    ///
    /// # Errors
    ///
    /// [`LockoutError::InvalidConfig`] when `config` fails validation.
    pub fn new(cache: Arc<dyn CounterCache>, config: LockoutConfig) -> Result<Self, LockoutError> {
        config.validate()?;
        Ok(Self { cache, config })
    }

    pub fn config(&self) -> &LockoutConfig {
        &self.config
    }

    pub fn user_key(user_id: &str) -> String {
        format!("{USER_PREFIX}{user_id}")
    }

    pub fn origin_key(origin_id: &str) -> String {
        format!("{ORIGIN_PREFIX}{origin_id}")
    }

    fn threshold(&self) -> u64 {
        u64::from(self.config.max_attempts)
    }

    /// Record one failed authentication for `user_id` from `origin`.
    ///
    /// Both counters are incremented atomically in the cache and their
    /// windows restarted. Returns the state implied by the new counts.
    ///
    /// # Errors
    ///
    /// [`LockoutError::CollaboratorUnavailable`] when either increment fails
    /// or times out.
    pub async fn record_failure(
        &self,
        user_id: &str,
        origin: Option<&str>,
    ) -> Result<LockoutState, LockoutError> {
        let window = self.config.window();
        let user_count = self
            .call(self.cache.increment_with_expiry(&Self::user_key(user_id), window))
            .await
            .inspect_err(|e| warn!(user = %user_id, error = %e, "Failed to record login failure"))?;

        let origin_count = match origin {
            Some(origin) => self
                .call(self.cache.increment_with_expiry(&Self::origin_key(origin), window))
                .await
                .inspect_err(|e| warn!(origin = %origin, error = %e, "Failed to record origin failure"))?,
            None => 0,
        };

        let state = LockoutState::from_attempts(user_count.max(origin_count), self.threshold());
        if state.is_locked() {
            warn!(
                user = %user_id,
                origin = origin.unwrap_or("-"),
                user_attempts = user_count,
                origin_attempts = origin_count,
                "Lockout threshold reached"
            );
        } else {
            debug!(user = %user_id, user_attempts = user_count, origin_attempts = origin_count, "Login failure recorded");
        }
        Ok(state)
    }

    /// Clear the user counter after a successful authentication.
    ///
    /// # Errors
    ///
    /// [`LockoutError::CollaboratorUnavailable`] when the delete fails.
    pub async fn record_success(&self, user_id: &str) -> Result<(), LockoutError> {
        self.call(self.cache.delete(&Self::user_key(user_id)))
            .await
            .inspect_err(|e| warn!(user = %user_id, error = %e, "Failed to clear login failures"))?;
        debug!(user = %user_id, "Login failures cleared");
        Ok(())
    }

    /// Current counts for the pair, `(user, origin)`.
    ///
    /// # Errors
    ///
    /// [`LockoutError::CollaboratorUnavailable`] when either read fails.
    pub async fn attempts(&self, user_id: &str, origin: Option<&str>) -> Result<(u64, u64), LockoutError> {
        let user = self.call(self.cache.get(&Self::user_key(user_id))).await?;
        let origin = match origin {
            Some(origin) => self.call(self.cache.get(&Self::origin_key(origin))).await?,
            None => None,
        };
        Ok((user.unwrap_or(0), origin.unwrap_or(0)))
    }

    /// Where the pair stands. Cache failures resolve through the configured
    /// [`FailureMode`]: `Clear` when failing open, `Locked` when failing closed.
    pub async fn state(&self, user_id: &str, origin: Option<&str>) -> LockoutState {
        match self.attempts(user_id, origin).await {
            Ok((user, origin)) => LockoutState::from_attempts(user.max(origin), self.threshold()),
            Err(e) => {
                let mode = self.config.failure_mode;
                warn!(user = %user_id, error = %e, mode = ?mode, "Lockout state unknown; applying failure mode");
                match mode {
                    FailureMode::FailOpen => LockoutState::Clear,
                    FailureMode::FailClosed => LockoutState::Locked,
                }
            }
        }
    }

    /// True iff the user counter or the origin counter has reached the threshold.
    pub async fn is_locked(&self, user_id: &str, origin: Option<&str>) -> bool {
        self.state(user_id, origin).await.is_locked()
    }

    async fn call<T, F>(&self, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        let deadline = self.config.cache_timeout();
        match tokio::time::timeout(deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(deadline)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use warden_cache::{FaultyCache, InMemoryCache};

    fn tracker_with(config: LockoutConfig) -> (LockoutTracker, FaultyCache<InMemoryCache>) {
        let cache = FaultyCache::new(InMemoryCache::new());
        let tracker = LockoutTracker::new(Arc::new(cache.clone()), config).unwrap();
        (tracker, cache)
    }

    fn tracker() -> (LockoutTracker, FaultyCache<InMemoryCache>) {
        tracker_with(LockoutConfig {
            max_attempts: 3,
            ..LockoutConfig::default()
        })
    }

    #[tokio::test]
    async fn test_state_progression() {
        let (tracker, _) = tracker();
        assert_eq!(tracker.state("u1", Some("o1")).await, LockoutState::Clear);

        let s = tracker.record_failure("u1", Some("o1")).await.unwrap();
        assert_eq!(s, LockoutState::Warning { attempts: 1, remaining: 2 });
        tracker.record_failure("u1", Some("o1")).await.unwrap();
        assert!(!tracker.is_locked("u1", Some("o1")).await);

        let s = tracker.record_failure("u1", Some("o1")).await.unwrap();
        assert_eq!(s, LockoutState::Locked);
        assert!(tracker.is_locked("u1", Some("o1")).await);
    }

    #[tokio::test]
    async fn test_origin_lockout_blocks_other_users() {
        let (tracker, _) = tracker();
        for _ in 0..3 {
            tracker.record_failure("u1", Some("o1")).await.unwrap();
        }
        assert!(tracker.is_locked("u2", Some("o1")).await);
        assert!(!tracker.is_locked("u2", Some("o2")).await);
    }

    #[tokio::test]
    async fn test_user_lockout_follows_user_across_origins() {
        let (tracker, _) = tracker();
        for origin in ["o1", "o2", "o3"] {
            tracker.record_failure("u1", Some(origin)).await.unwrap();
        }
        assert!(tracker.is_locked("u1", Some("o4")).await);
        assert!(tracker.is_locked("u1", None).await);
    }

    #[tokio::test]
    async fn test_lockout_is_or_not_sum() {
        let (tracker, _) = tracker();
        // Two failures for u1 from o1, one for u2 from o2: nothing reaches 3.
        tracker.record_failure("u1", Some("o1")).await.unwrap();
        tracker.record_failure("u1", Some("o1")).await.unwrap();
        tracker.record_failure("u2", Some("o2")).await.unwrap();
        assert!(!tracker.is_locked("u1", Some("o2")).await);
    }

    #[tokio::test]
    async fn test_success_clears_user_but_not_origin() {
        let (tracker, _) = tracker();
        for _ in 0..3 {
            tracker.record_failure("u1", Some("o1")).await.unwrap();
        }
        tracker.record_success("u1").await.unwrap();

        assert_eq!(tracker.attempts("u1", Some("o1")).await.unwrap(), (0, 3));
        assert!(tracker.is_locked("u1", Some("o1")).await);
        assert!(!tracker.is_locked("u1", Some("o2")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_expiry_unlocks() {
        let (tracker, _) = tracker_with(LockoutConfig {
            max_attempts: 2,
            window_secs: 60,
            ..LockoutConfig::default()
        });
        tracker.record_failure("u1", Some("o1")).await.unwrap();
        tracker.record_failure("u1", Some("o1")).await.unwrap();
        assert!(tracker.is_locked("u1", Some("o1")).await);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(tracker.is_locked("u1", Some("o1")).await);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!tracker.is_locked("u1", Some("o1")).await);
        assert_eq!(tracker.state("u1", Some("o1")).await, LockoutState::Clear);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_failure_restarts_window() {
        let (tracker, _) = tracker_with(LockoutConfig {
            max_attempts: 5,
            window_secs: 60,
            ..LockoutConfig::default()
        });
        tracker.record_failure("u1", None).await.unwrap();
        tokio::time::advance(Duration::from_secs(50)).await;
        tracker.record_failure("u1", None).await.unwrap();
        tokio::time::advance(Duration::from_secs(50)).await;

        assert_eq!(tracker.attempts("u1", None).await.unwrap(), (2, 0));
    }

    #[tokio::test]
    async fn test_fail_open_on_outage() {
        let (tracker, cache) = tracker();
        for _ in 0..3 {
            tracker.record_failure("u1", Some("o1")).await.unwrap();
        }
        cache.set_unavailable(true);

        assert!(!tracker.is_locked("u1", Some("o1")).await);
        assert!(matches!(
            tracker.record_failure("u1", Some("o1")).await,
            Err(LockoutError::CollaboratorUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_fail_closed_on_outage() {
        let (tracker, cache) = tracker_with(LockoutConfig {
            failure_mode: FailureMode::FailClosed,
            ..LockoutConfig::default()
        });
        cache.set_unavailable(true);
        assert!(tracker.is_locked("fresh", None).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_cache_times_out_into_failure_mode() {
        let (tracker, cache) = tracker_with(LockoutConfig {
            failure_mode: FailureMode::FailClosed,
            cache_timeout_ms: 100,
            ..LockoutConfig::default()
        });
        cache.set_latency(Duration::from_secs(5));

        assert!(tracker.is_locked("u1", None).await);
        assert!(matches!(
            tracker.attempts("u1", None).await,
            Err(LockoutError::CollaboratorUnavailable(CacheError::Timeout(_)))
        ));
    }

    #[test]
    fn test_keys() {
        assert_eq!(LockoutTracker::user_key("u1"), "failed_attempts:user:u1");
        assert_eq!(LockoutTracker::origin_key("10.0.0.1"), "failed_attempts:origin:10.0.0.1");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cache: Arc<dyn CounterCache> = Arc::new(InMemoryCache::new());
        let config = LockoutConfig {
            max_attempts: 0,
            ..LockoutConfig::default()
        };
        assert!(LockoutTracker::new(cache.clone(), config).is_err());

        let endless = LockoutConfig {
            window_secs: u64::MAX,
            ..LockoutConfig::default()
        };
        assert!(matches!(
            LockoutTracker::new(cache, endless),
            Err(LockoutError::InvalidConfig(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_longest_window_records_failures() {
        let config = LockoutConfig {
            window_secs: crate::config::MAX_WINDOW_SECS,
            ..LockoutConfig::default()
        };
        let tracker = LockoutTracker::new(Arc::new(InMemoryCache::new()), config).unwrap();
        tracker.record_failure("u1", Some("o1")).await.unwrap();
        assert_eq!(tracker.attempts("u1", Some("o1")).await.unwrap(), (1, 1));
    }
}

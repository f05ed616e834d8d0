// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Lockout configuration.
//!
//! Defaults:
//! - max_attempts: 5
//! - window: 15 minutes, restarted by every failure
//! - failure_mode: fail open
//! - cache_timeout: 250 ms

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LockoutError;

/// Longest accepted counter window: 30 days.
pub const MAX_WINDOW_SECS: u64 = 30 * 24 * 60 * 60;

/// Longest accepted per-call cache deadline: one minute.
pub const MAX_CACHE_TIMEOUT_MS: u64 = 60_000;

/// What `is_locked` answers when the counter cache cannot be reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Treat the account as not locked. A cache outage does not become an
    /// authentication outage.
    #[default]
    FailOpen,
    /// Treat the account as locked until the cache is reachable again.
    FailClosed,
}

/// Configuration for [`LockoutTracker`](crate::LockoutTracker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutConfig {
    /// Failures (per user or per origin) at which the key is locked.
    pub max_attempts: u32,
    /// Counter lifetime in seconds, restarted on every failure.
    pub window_secs: u64,
    /// Behaviour when the cache is unreachable.
    pub failure_mode: FailureMode,
    /// Deadline for each cache call, in milliseconds.
    pub cache_timeout_ms: u64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_secs: 15 * 60,
            failure_mode: FailureMode::FailOpen,
            cache_timeout_ms: 250,
        }
    }
}

impl LockoutConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    /// Defaults overridden by `WARDEN_MAX_LOGIN_ATTEMPTS`,
    /// `WARDEN_LOCKOUT_WINDOW_SECS`, `WARDEN_LOCKOUT_FAIL_CLOSED` and
    /// `WARDEN_CACHE_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, LockoutError> {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from any variable source. Unset variables keep the
    /// current value.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), LockoutError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "WARDEN_MAX_LOGIN_ATTEMPTS")? {
            self.max_attempts = v;
        }
        if let Some(v) = parse_var(&lookup, "WARDEN_LOCKOUT_WINDOW_SECS")? {
            self.window_secs = v;
        }
        if let Some(v) = parse_var::<bool, _>(&lookup, "WARDEN_LOCKOUT_FAIL_CLOSED")? {
            self.failure_mode = if v {
                FailureMode::FailClosed
            } else {
                FailureMode::FailOpen
            };
        }
        if let Some(v) = parse_var(&lookup, "WARDEN_CACHE_TIMEOUT_MS")? {
            self.cache_timeout_ms = v;
        }
        self.validate()
    }

    /// Reject values the tracker cannot work with.
    pub fn validate(&self) -> Result<(), LockoutError> {
        if self.max_attempts == 0 {
            return Err(LockoutError::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }
        if self.window_secs == 0 || self.window_secs > MAX_WINDOW_SECS {
            return Err(LockoutError::InvalidConfig(format!(
                "window_secs must be between 1 and {MAX_WINDOW_SECS}, got {}",
                self.window_secs
            )));
        }
        if self.cache_timeout_ms == 0 || self.cache_timeout_ms > MAX_CACHE_TIMEOUT_MS {
            return Err(LockoutError::InvalidConfig(format!(
                "cache_timeout_ms must be between 1 and {MAX_CACHE_TIMEOUT_MS}, got {}",
                self.cache_timeout_ms
            )));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>, LockoutError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| LockoutError::InvalidConfig(format!("{name}={raw:?}"))),
    }
}
